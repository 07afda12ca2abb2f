//! Storage setup and initialization

use anyhow::Result;
use lane_core::Config;
use lane_storage::{create_storage, Storage};
use std::sync::Arc;

/// Construct the configured storage backend. Fails fast when the selected
/// backend's settings are incomplete; the server never starts with a
/// partially configured provider.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config).await?;
    tracing::info!(
        backend = %storage.backend_type(),
        "Storage abstraction initialized successfully"
    );
    Ok(storage)
}
