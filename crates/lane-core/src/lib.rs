//! Lane Core Library
//!
//! This crate provides configuration, error types, and the storage backend
//! selector shared across the Memory Lane service crates.

pub mod config;
pub mod error;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, StorageSettings};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
