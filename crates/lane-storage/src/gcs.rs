use crate::traits::{Storage, StorageError, StorageResult, UploadDescriptor, UploadOptions};
use crate::{keys, StorageBackend};
use async_trait::async_trait;
use futures::future::join_all;
use http::Method;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, Result as ObjectResult};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Google Cloud Storage implementation
///
/// Same shape as the S3 backend: clients upload directly to the bucket with
/// a time-boxed signed PUT URL minted from the service account credentials.
#[derive(Clone)]
pub struct GcsStorage {
    store: GoogleCloudStorage,
    url_prefix: String,
    url_expiry: Duration,
}

impl GcsStorage {
    /// Create a new GcsStorage instance
    ///
    /// # Arguments
    /// * `bucket` - GCS bucket name
    /// * `service_account` - Optional path to a service account key file;
    ///   falls back to application-default credentials from the environment
    /// * `cdn_base_url` - Optional CDN hostname substituted for the native
    ///   object URL; takes precedence when configured
    /// * `url_expiry` - Validity window for signed upload URLs
    pub async fn new(
        bucket: String,
        service_account: Option<String>,
        cdn_base_url: Option<String>,
        url_expiry: Duration,
    ) -> StorageResult<Self> {
        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket.clone());

        if let Some(ref path) = service_account {
            builder = builder.with_service_account_path(path.clone());
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(GcsStorage {
            store,
            url_prefix: url_prefix(cdn_base_url.as_deref(), &bucket),
            url_expiry,
        })
    }

    /// Generate public URL for an object key
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }
}

/// Compute the public URL prefix all object URLs share.
///
/// CDN base takes precedence; otherwise the conventional public object form
/// `https://storage.googleapis.com/{bucket}` is used.
fn url_prefix(cdn_base_url: Option<&str>, bucket: &str) -> String {
    if let Some(cdn) = cdn_base_url {
        return cdn.trim_end_matches('/').to_string();
    }
    format!("https://storage.googleapis.com/{}", bucket)
}

#[async_trait]
impl Storage for GcsStorage {
    async fn issue_upload(
        &self,
        owner_id: Uuid,
        options: &UploadOptions,
    ) -> StorageResult<UploadDescriptor> {
        let key = keys::generate_object_key(owner_id, options.content_type.as_deref());
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let upload_url: ObjectResult<_> = self
            .store
            .signed_url(Method::PUT, &location, self.url_expiry)
            .await;

        let upload_url = upload_url.map_err(|e| {
            tracing::error!(
                error = %e,
                key = %key,
                "GCS upload URL signing failed"
            );
            StorageError::UpstreamError(e.to_string())
        })?;

        let file_url = self.generate_url(&key);

        tracing::info!(
            owner_id = %owner_id,
            key = %key,
            expires_in_secs = self.url_expiry.as_secs(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Issued signed GCS upload URL"
        );

        Ok(UploadDescriptor {
            upload_url: upload_url.to_string(),
            fields: HashMap::new(),
            file_url,
            key,
        })
    }

    async fn put_object(
        &self,
        _storage_key: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> StorageResult<String> {
        Err(StorageError::ConfigError(
            "Direct upload proxying is only available with the local storage backend".to_string(),
        ))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;
        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => StorageError::UpstreamError(other.to_string()),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::UpstreamError(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    fn extract_key(&self, file_url: &str) -> StorageResult<String> {
        let prefix = format!("{}/", self.url_prefix);
        match file_url.strip_prefix(&prefix) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(StorageError::InvalidUrl(file_url.to_string())),
        }
    }

    async fn delete_object(&self, file_url: &str) -> StorageResult<()> {
        let key = self.extract_key(file_url)?;
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) => {}
            Err(ObjectStoreError::NotFound { .. }) => return Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    url = %file_url,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "GCS delete failed"
                );
                return Err(StorageError::UpstreamError(e.to_string()));
            }
        }

        tracing::info!(
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS delete successful"
        );

        Ok(())
    }

    async fn delete_objects(&self, file_urls: &[String]) -> usize {
        let outcomes = join_all(file_urls.iter().map(|url| async move {
            if let Err(e) = self.delete_object(url).await {
                tracing::warn!(error = %e, url = %url, "Batch deletion failed for object");
                false
            } else {
                true
            }
        }))
        .await;

        outcomes.into_iter().filter(|ok| !ok).count()
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::UpstreamError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Gcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventional_public_url_without_cdn() {
        assert_eq!(
            url_prefix(None, "lane-media"),
            "https://storage.googleapis.com/lane-media"
        );
    }

    #[test]
    fn cdn_base_takes_precedence() {
        assert_eq!(
            url_prefix(Some("https://cdn.example.com"), "lane-media"),
            "https://cdn.example.com"
        );
    }

    #[test]
    fn url_round_trips_through_prefix() {
        let prefix = url_prefix(None, "lane-media");
        let key = "11111111-2222-3333-4444-555555555555/1700000000000_cafebabecafebabe.png";
        let url = format!("{}/{}", prefix, key);
        assert_eq!(url.strip_prefix(&format!("{}/", prefix)).unwrap(), key);
    }
}
