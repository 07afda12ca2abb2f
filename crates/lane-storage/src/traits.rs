//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement, the upload descriptor returned to clients, and the storage
//! error taxonomy.

use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Required credentials or paths for the selected backend are missing or
    /// invalid. Fatal at construction; no degraded provider is ever returned.
    #[error("Storage configuration error: {0}")]
    ConfigError(String),

    /// The signing or delete call to the remote backend failed.
    #[error("Upstream storage call failed: {0}")]
    UpstreamError(String),

    #[error("File not found: {0}")]
    NotFound(String),

    /// A computed local path escapes the configured root. Always a bug or an
    /// attack, never retried.
    #[error("Storage key escapes the storage root: {0}")]
    PathTraversal(String),

    /// The URL cannot be mapped into the active backend's key space.
    #[error("URL does not belong to the active storage backend: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Constraints for a requested upload descriptor.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Content type the uploaded object is expected to carry. Used to derive
    /// the key's extension suffix and, where the backend supports it, to
    /// constrain the signed upload.
    pub content_type: Option<String>,
}

/// Everything a client needs to upload one object directly to storage.
///
/// `file_url` is deterministic and computed before the object exists; no
/// backend requires a round trip after upload to learn the final URL.
#[derive(Debug, Clone)]
pub struct UploadDescriptor {
    /// URL the client sends the bytes to (signed PUT URL for cloud backends,
    /// the application's own direct-upload route for local storage).
    pub upload_url: String,
    /// Form fields the client must include. Empty for backends that accept a
    /// raw PUT; the local backend requires `key`.
    pub fields: HashMap<String, String>,
    /// Public URL the object will be reachable at once uploaded.
    pub file_url: String,
    /// The object key the descriptor was minted for.
    pub key: String,
}

/// Storage abstraction trait
///
/// All storage backends (local filesystem, S3-compatible, GCS) must implement
/// this trait. A single instance is constructed at startup and shared by all
/// requests; implementations must be stateless beyond their fixed
/// configuration.
///
/// **Round-trip law:** for any descriptor returned by `issue_upload`,
/// `extract_key(descriptor.file_url)` recovers `descriptor.key` exactly.
/// Deletion correctness depends on it.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Mint a time-boxed upload descriptor for the given owner.
    ///
    /// Performs at most one outbound signing call; the local backend only
    /// touches the filesystem to ensure the owner's directory exists.
    async fn issue_upload(
        &self,
        owner_id: Uuid,
        options: &UploadOptions,
    ) -> StorageResult<UploadDescriptor>;

    /// Write object bytes for a previously issued key and return the public
    /// URL.
    ///
    /// Only the local backend proxies uploads through the application
    /// process; cloud backends return a `ConfigError` since their clients
    /// upload directly via the signed URL.
    async fn put_object(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;

    /// Read an object's bytes by storage key.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Map a public URL previously issued by this backend to its object key.
    ///
    /// Fails with `InvalidUrl` when the URL is not in this backend's
    /// namespace.
    fn extract_key(&self, file_url: &str) -> StorageResult<String>;

    /// Delete the object behind a public URL.
    ///
    /// Idempotent: deleting an already-absent object is success, not an
    /// error.
    async fn delete_object(&self, file_url: &str) -> StorageResult<()>;

    /// Delete a batch of objects, attempting every URL regardless of earlier
    /// failures, and return the number of URLs that failed.
    ///
    /// No ordering is guaranteed between the deletions; they are a set, not
    /// a sequence. The default implementation delegates to `delete_object`
    /// sequentially; network-bound backends override it with concurrent
    /// deletes.
    async fn delete_objects(&self, file_urls: &[String]) -> usize {
        let mut failures = 0;
        for url in file_urls {
            if let Err(e) = self.delete_object(url).await {
                tracing::warn!(error = %e, url = %url, "Batch deletion failed for object");
                failures += 1;
            }
        }
        failures
    }

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
