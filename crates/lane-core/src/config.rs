//! Configuration module
//!
//! This module provides the environment-derived service configuration:
//! server settings, authentication secret, and the storage backend selection
//! with its per-backend credentials and paths.
//!
//! Configuration is read once at process start and never hot-reloaded; the
//! selected storage backend is constructed exactly once from these values.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_MAX_UPLOAD_SIZE_MB: usize = 10;
const DEFAULT_UPLOAD_URL_EXPIRY_SECS: u64 = 900;

/// Storage backend selection and per-backend settings.
///
/// Only the fields for the selected backend are required; the factory fails
/// fast when a required field for the active kind is absent.
#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    // Local backend
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // S3-compatible backend
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    // GCS backend
    pub gcs_bucket: Option<String>,
    pub google_service_account: Option<String>,
    // Optional public hostname substituted for the backend's native URL
    pub cdn_base_url: Option<String>,
}

/// Application configuration, derived once from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    cors_origins: Vec<String>,
    jwt_secret: String,
    environment: String,
    public_base_url: String,
    storage: StorageSettings,
    max_upload_size_bytes: usize,
    allowed_content_types: Vec<String>,
    upload_url_expiry_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins = parse_csv(&cors_origins_str);

        let server_port = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::from_str(&value)?,
            Err(_) => StorageBackend::Local,
        };

        let storage = StorageSettings {
            backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or(env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            gcs_bucket: env::var("GCS_BUCKET").ok(),
            google_service_account: env::var("GOOGLE_SERVICE_ACCOUNT").ok(),
            cdn_base_url: env::var("CDN_BASE_URL")
                .ok()
                .map(|s| s.trim_end_matches('/').to_string()),
        };

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB);

        let allowed_content_types = parse_csv(
            &env::var("ALLOWED_CONTENT_TYPES").unwrap_or_else(|_| {
                "image/jpeg,image/png,image/gif,image/webp".to_string()
            }),
        )
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect();

        Ok(Config {
            server_port,
            cors_origins,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", server_port))
                .trim_end_matches('/')
                .to_string(),
            storage,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            allowed_content_types,
            upload_url_expiry_secs: env::var("UPLOAD_URL_EXPIRY_SECS")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_URL_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_UPLOAD_URL_EXPIRY_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 16 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 16 characters long"
            ));
        }
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Base URL clients reach this service at; the local backend's
    /// direct-upload target is derived from it.
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    pub fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.max_upload_size_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    pub fn upload_url_expiry_secs(&self) -> u64 {
        self.upload_url_expiry_secs
    }
}

/// Construct a Config directly, bypassing the environment. Intended for tests
/// and embedding; `from_env` is the production path.
impl Config {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        server_port: u16,
        jwt_secret: String,
        environment: String,
        public_base_url: String,
        storage: StorageSettings,
        max_upload_size_bytes: usize,
        allowed_content_types: Vec<String>,
        upload_url_expiry_secs: u64,
    ) -> Self {
        Config {
            server_port,
            cors_origins: vec!["*".to_string()],
            jwt_secret,
            environment,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            storage,
            max_upload_size_bytes,
            allowed_content_types,
            upload_url_expiry_secs,
        }
    }
}

fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_settings() -> StorageSettings {
        StorageSettings {
            backend: StorageBackend::Local,
            local_storage_path: Some("/tmp/lane".to_string()),
            local_storage_base_url: Some("http://localhost:4000/media".to_string()),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            gcs_bucket: None,
            google_service_account: None,
            cdn_base_url: None,
        }
    }

    #[test]
    fn parse_csv_trims_and_drops_empty() {
        assert_eq!(
            parse_csv(" a, b ,,c "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(parse_csv("").is_empty());
    }

    #[test]
    fn validate_rejects_short_jwt_secret() {
        let config = Config::new(
            4000,
            "short".to_string(),
            "development".to_string(),
            "http://localhost:4000".to_string(),
            local_settings(),
            10 * 1024 * 1024,
            vec!["image/jpeg".to_string()],
            900,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn public_base_url_has_no_trailing_slash() {
        let config = Config::new(
            4000,
            "a-long-enough-secret".to_string(),
            "development".to_string(),
            "http://localhost:4000/".to_string(),
            local_settings(),
            10 * 1024 * 1024,
            vec![],
            900,
        );
        assert_eq!(config.public_base_url(), "http://localhost:4000");
        assert!(!config.is_production());
    }
}
