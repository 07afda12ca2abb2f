use crate::traits::{Storage, StorageError, StorageResult, UploadDescriptor, UploadOptions};
use crate::{keys, StorageBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem storage implementation
///
/// Objects are stored as files under a configured root directory and served
/// back through the application's static file route. Unlike the cloud
/// backends there is no external signing authority, so uploads are proxied
/// through the application's direct-upload endpoint.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    upload_target: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/lane/media")
    /// * `base_url` - Base URL files are served from (e.g., "http://localhost:4000/media")
    /// * `upload_target` - The application's direct-upload endpoint URL
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        upload_target: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_target,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys whose resolved path would escape the configured root.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if !keys::is_well_formed(storage_key) {
            return Err(StorageError::PathTraversal(storage_key.to_string()));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        // A key that survives the lexical check can still escape through a
        // symlink; canonicalize catches that once the path exists.
        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::PathTraversal(storage_key.to_string()));
            }
        }

        Ok(path)
    }

    /// Generate public URL for a storage key
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Remove now-empty directories above a deleted file, stopping at the
    /// storage root or the first non-empty directory.
    ///
    /// Each step strictly reduces depth, so the walk is bounded. The root
    /// itself is never removed.
    async fn prune_empty_dirs(&self, mut dir: Option<&Path>) {
        while let Some(current) = dir {
            if current == self.base_path || !current.starts_with(&self.base_path) {
                break;
            }
            if fs::remove_dir(current).await.is_err() {
                // Non-empty or already gone; either way the walk is done.
                break;
            }
            tracing::debug!(path = %current.display(), "Removed empty storage directory");
            dir = current.parent();
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn issue_upload(
        &self,
        owner_id: Uuid,
        options: &UploadOptions,
    ) -> StorageResult<UploadDescriptor> {
        let key = keys::generate_object_key(owner_id, options.content_type.as_deref());
        let path = self.key_to_path(&key)?;

        // Create the owner's subdirectory up front so the direct upload is a
        // plain file write.
        self.ensure_parent_dir(&path).await?;

        let mut fields = HashMap::new();
        fields.insert("key".to_string(), key.clone());

        let file_url = self.generate_url(&key);

        tracing::debug!(
            owner_id = %owner_id,
            key = %key,
            "Issued local upload descriptor"
        );

        Ok(UploadDescriptor {
            upload_url: self.upload_target.clone(),
            fields,
            file_url,
            key,
        })
    }

    async fn put_object(
        &self,
        storage_key: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;

        let url = self.generate_url(storage_key);

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(url)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let data = fs::read(&path).await?;
        Ok(data)
    }

    fn extract_key(&self, file_url: &str) -> StorageResult<String> {
        let prefix = format!("{}/", self.base_url);
        match file_url.strip_prefix(&prefix) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(StorageError::InvalidUrl(file_url.to_string())),
        }
    }

    async fn delete_object(&self, file_url: &str) -> StorageResult<()> {
        let key = self.extract_key(file_url)?;
        let path = self.key_to_path(&key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            // Already absent counts as deleted.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        self.prune_empty_dirs(path.parent()).await;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const BASE_URL: &str = "http://localhost:4000/media";
    const UPLOAD_TARGET: &str = "http://localhost:4000/api/v0/files/direct-upload";

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, BASE_URL.to_string(), UPLOAD_TARGET.to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn descriptor_round_trips_key_through_url() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let owner = Uuid::new_v4();
        let descriptor = storage
            .issue_upload(owner, &UploadOptions::default())
            .await
            .unwrap();

        assert_eq!(descriptor.upload_url, UPLOAD_TARGET);
        assert_eq!(descriptor.fields.get("key"), Some(&descriptor.key));
        assert_eq!(
            storage.extract_key(&descriptor.file_url).unwrap(),
            descriptor.key
        );
        // Owner directory was created by issuance.
        assert!(dir.path().join(owner.to_string()).is_dir());
    }

    #[tokio::test]
    async fn put_then_download_returns_bytes() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let owner = Uuid::new_v4();
        let descriptor = storage
            .issue_upload(
                owner,
                &UploadOptions {
                    content_type: Some("image/png".to_string()),
                },
            )
            .await
            .unwrap();

        let data = b"png bytes".to_vec();
        let url = storage
            .put_object(&descriptor.key, "image/png", data.clone())
            .await
            .unwrap();
        assert_eq!(url, descriptor.file_url);

        let downloaded = storage.download(&descriptor.key).await.unwrap();
        assert_eq!(data, downloaded);
        assert!(storage.exists(&descriptor.key).await.unwrap());
    }

    #[tokio::test]
    async fn path_traversal_is_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage
            .delete_object(&format!("{}/../../etc/passwd", BASE_URL))
            .await;
        assert!(matches!(result, Err(StorageError::PathTraversal(_))));

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::PathTraversal(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::PathTraversal(_))));

        // Nothing outside the root was touched; the root itself still exists.
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn deleting_absent_object_is_success() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let owner = Uuid::new_v4();
        let url = format!("{}/{}/1700000000000_deadbeefdeadbeef.jpg", BASE_URL, owner);
        assert!(storage.delete_object(&url).await.is_ok());
    }

    #[tokio::test]
    async fn foreign_url_is_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage
            .delete_object("https://elsewhere.example.com/media/a/b.jpg")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn deleting_last_file_prunes_owner_dir_but_not_root() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let owner = Uuid::new_v4();
        let descriptor = storage
            .issue_upload(owner, &UploadOptions::default())
            .await
            .unwrap();
        storage
            .put_object(&descriptor.key, "image/jpeg", b"x".to_vec())
            .await
            .unwrap();

        let owner_dir = dir.path().join(owner.to_string());
        assert!(owner_dir.is_dir());

        storage.delete_object(&descriptor.file_url).await.unwrap();

        assert!(!owner_dir.exists());
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn pruning_stops_at_first_non_empty_dir() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let owner = Uuid::new_v4();
        let first = storage
            .issue_upload(owner, &UploadOptions::default())
            .await
            .unwrap();
        let second = storage
            .issue_upload(owner, &UploadOptions::default())
            .await
            .unwrap();
        storage
            .put_object(&first.key, "image/jpeg", b"a".to_vec())
            .await
            .unwrap();
        storage
            .put_object(&second.key, "image/jpeg", b"b".to_vec())
            .await
            .unwrap();

        storage.delete_object(&first.file_url).await.unwrap();

        // The sibling keeps the owner directory alive.
        assert!(dir.path().join(owner.to_string()).is_dir());
        assert!(storage.exists(&second.key).await.unwrap());
    }

    #[tokio::test]
    async fn batch_delete_attempts_every_url() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let owner = Uuid::new_v4();
        let descriptor = storage
            .issue_upload(owner, &UploadOptions::default())
            .await
            .unwrap();
        storage
            .put_object(&descriptor.key, "image/jpeg", b"keep trying".to_vec())
            .await
            .unwrap();

        let urls = vec![
            "https://elsewhere.example.com/media/a/b.jpg".to_string(),
            descriptor.file_url.clone(),
        ];
        let failures = storage.delete_objects(&urls).await;

        // The foreign URL fails, the real object is still deleted.
        assert_eq!(failures, 1);
        assert!(!storage.exists(&descriptor.key).await.unwrap());
    }
}
