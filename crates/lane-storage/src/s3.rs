use crate::traits::{Storage, StorageError, StorageResult, UploadDescriptor, UploadOptions};
use crate::{keys, StorageBackend};
use async_trait::async_trait;
use futures::future::join_all;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, Result as ObjectResult};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// S3-compatible storage implementation
///
/// Clients upload directly to the bucket with a time-boxed signed PUT URL;
/// the application never handles the file bytes.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    url_prefix: String,
    url_expiry: Duration,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `cdn_base_url` - Optional CDN hostname substituted for the native
    ///   object URL; takes precedence when configured
    /// * `url_expiry` - Validity window for signed upload URLs
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        cdn_base_url: Option<String>,
        url_expiry: Duration,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            url_prefix: url_prefix(
                cdn_base_url.as_deref(),
                endpoint_url.as_deref(),
                &bucket,
                &region,
            ),
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
/// CDN base takes precedence when configured. Without one, custom endpoints
/// use path-style addressing (`{endpoint}/{bucket}`) for compatibility with
/// MinIO and similar providers, and plain AWS uses the standard
/// virtual-hosted form.
fn url_prefix(
    cdn_base_url: Option<&str>,
    endpoint_url: Option<&str>,
    bucket: &str,
    region: &str,
) -> String {
    if let Some(cdn) = cdn_base_url {
        return cdn.trim_end_matches('/').to_string();
    }
    if let Some(endpoint) = endpoint_url {
        return format!("{}/{}", endpoint.trim_end_matches('/'), bucket);
    }
    format!("https://{}.s3.{}.amazonaws.com", bucket, region)
}

#[async_trait]
impl Storage for S3Storage {
    async fn issue_upload(
        &self,
        owner_id: Uuid,
        options: &UploadOptions,
    ) -> StorageResult<UploadDescriptor> {
        let key = keys::generate_object_key(owner_id, options.content_type.as_deref());
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        // The one outbound call needed to mint the descriptor.
        let upload_url: ObjectResult<_> = self
            .store
            .signed_url(Method::PUT, &location, self.url_expiry)
            .await;

        let upload_url = upload_url.map_err(|e| {
            tracing::error!(
                error = %e,
                key = %key,
                "S3 upload URL signing failed"
            );
            StorageError::UpstreamError(e.to_string())
        })?;

        let file_url = self.generate_url(&key);

        tracing::info!(
            owner_id = %owner_id,
            key = %key,
            expires_in_secs = self.url_expiry.as_secs(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Issued signed S3 upload URL"
        );

        Ok(UploadDescriptor {
            upload_url: upload_url.to_string(),
            // Raw signed PUT; no form fields required.
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
            // The object being gone already is the outcome we wanted.
            Err(ObjectStoreError::NotFound { .. }) => return Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    url = %file_url,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::UpstreamError(e.to_string()));
            }
        }

        tracing::info!(
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn delete_objects(&self, file_urls: &[String]) -> usize {
        // Deletes are independent and network-bound; issue them concurrently
        // and wait for every outcome.
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
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_hosted_url_for_plain_aws() {
        let prefix = url_prefix(None, None, "lane-media", "eu-west-1");
        assert_eq!(prefix, "https://lane-media.s3.eu-west-1.amazonaws.com");
    }

    #[test]
    fn path_style_url_for_custom_endpoint() {
        let prefix = url_prefix(None, Some("http://localhost:9000/"), "lane-media", "us-east-1");
        assert_eq!(prefix, "http://localhost:9000/lane-media");
    }

    #[test]
    fn cdn_base_takes_precedence() {
        let prefix = url_prefix(
            Some("https://cdn.example.com/"),
            Some("http://localhost:9000"),
            "lane-media",
            "us-east-1",
        );
        assert_eq!(prefix, "https://cdn.example.com");
    }

    #[test]
    fn url_round_trips_through_prefix() {
        let prefix = url_prefix(None, None, "lane-media", "us-east-1");
        let key = "11111111-2222-3333-4444-555555555555/1700000000000_cafebabecafebabe.jpg";
        let url = format!("{}/{}", prefix, key);
        assert_eq!(url.strip_prefix(&format!("{}/", prefix)).unwrap(), key);
    }
}
