#[cfg(feature = "storage-gcs")]
use crate::GcsStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use lane_core::Config;
use std::sync::Arc;
#[cfg(any(feature = "storage-s3", feature = "storage-gcs"))]
use std::time::Duration;

/// Create the storage backend selected by configuration.
///
/// Called exactly once at startup; the returned instance is shared by every
/// request for the process lifetime. Missing required settings for the
/// selected backend fail here, before the server accepts any traffic.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let settings = config.storage();

    match settings.backend {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = settings.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = settings.local_storage_base_url.clone().unwrap_or_else(|| {
                format!("{}/media", config.public_base_url())
            });
            let upload_target =
                format!("{}/api/v0/files/direct-upload", config.public_base_url());

            let storage = LocalStorage::new(base_path, base_url, upload_target).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = settings.s3_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_BUCKET not configured".to_string())
            })?;
            let region = settings.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;

            let storage = S3Storage::new(
                bucket,
                region,
                settings.s3_endpoint.clone(),
                settings.cdn_base_url.clone(),
                Duration::from_secs(config.upload_url_expiry_secs()),
            )
            .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-gcs")]
        StorageBackend::Gcs => {
            let bucket = settings.gcs_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError("GCS_BUCKET not configured".to_string())
            })?;

            let storage = GcsStorage::new(
                bucket,
                settings.google_service_account.clone(),
                settings.cdn_base_url.clone(),
                Duration::from_secs(config.upload_url_expiry_secs()),
            )
            .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-gcs"))]
        StorageBackend::Gcs => Err(StorageError::ConfigError(
            "GCS storage backend not available (storage-gcs feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use lane_core::StorageSettings;

    fn config_with(settings: StorageSettings) -> Config {
        Config::new(
            4000,
            "a-long-enough-secret".to_string(),
            "development".to_string(),
            "http://localhost:4000".to_string(),
            settings,
            10 * 1024 * 1024,
            vec!["image/jpeg".to_string()],
            900,
        )
    }

    fn empty_settings(backend: StorageBackend) -> StorageSettings {
        StorageSettings {
            backend,
            local_storage_path: None,
            local_storage_base_url: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            gcs_bucket: None,
            google_service_account: None,
            cdn_base_url: None,
        }
    }

    #[tokio::test]
    async fn local_backend_without_path_fails_fast() {
        let config = config_with(empty_settings(StorageBackend::Local));
        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[cfg(feature = "storage-s3")]
    #[tokio::test]
    async fn s3_backend_without_bucket_fails_fast() {
        let config = config_with(empty_settings(StorageBackend::S3));
        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[cfg(feature = "storage-gcs")]
    #[tokio::test]
    async fn gcs_backend_without_bucket_fails_fast() {
        let config = config_with(empty_settings(StorageBackend::Gcs));
        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn local_backend_constructs_and_reports_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = empty_settings(StorageBackend::Local);
        settings.local_storage_path = Some(dir.path().to_string_lossy().into_owned());
        settings.local_storage_base_url = Some("http://localhost:4000/media".to_string());

        let storage = create_storage(&config_with(settings)).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }
}
