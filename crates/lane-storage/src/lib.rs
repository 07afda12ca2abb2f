//! Lane Storage Library
//!
//! This crate provides the storage abstraction and backend implementations
//! for the Memory Lane service: the Storage trait plus local filesystem,
//! S3-compatible, and GCS implementations.
//!
//! # Object key format
//!
//! Every object key is owner-scoped: `{owner_id}/{timestamp_ms}_{random_hex}`
//! with an optional extension suffix. The owner prefix prevents cross-user
//! collisions and enables per-user cleanup; the timestamp plus random
//! component makes keys practically unique without coordination. Key
//! generation is centralized in the `keys` module so all backends stay
//! consistent, and every backend can map a public URL it issued back to the
//! exact key that minted it.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-gcs")]
pub mod gcs;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-gcs")]
pub use gcs::GcsStorage;
pub use lane_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, UploadDescriptor, UploadOptions};
