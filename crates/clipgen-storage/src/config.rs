//! Upload bucket configuration.

use std::time::Duration;

use crate::error::{StorageError, StorageResult};

/// Default lifetime of a pre-signed upload URL.
pub const DEFAULT_UPLOAD_EXPIRY: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket receiving user uploads
    pub bucket_name: String,
    /// Region used when signing without the default provider chain
    pub region: String,
    /// Public base URL of the CDN in front of the bucket
    pub cdn_base_url: String,
    /// Top-level prefix for user uploads
    pub upload_prefix: String,
    pub upload_expiry: Duration,
}

impl StorageConfig {
    /// Create config from environment variables.
    ///
    /// `CDN_BASE_URL` falls back to `CLOUDFRONT_URL`.
    pub fn from_env() -> StorageResult<Self> {
        let cdn_base_url = std::env::var("CDN_BASE_URL")
            .or_else(|_| std::env::var("CLOUDFRONT_URL"))
            .map_err(|_| StorageError::config_error("CDN_BASE_URL not set"))?;
        validate_base_url(&cdn_base_url)?;

        Ok(Self {
            bucket_name: std::env::var("UPLOAD_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("UPLOAD_BUCKET_NAME not set"))?,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            cdn_base_url,
            upload_prefix: std::env::var("UPLOAD_PREFIX")
                .unwrap_or_else(|_| "user-uploads".to_string()),
            upload_expiry: std::env::var("UPLOAD_URL_EXPIRY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_UPLOAD_EXPIRY),
        })
    }

    /// Config for local runs and tests.
    pub fn local(cdn_base_url: impl Into<String>) -> Self {
        Self {
            bucket_name: "clipgen-local".to_string(),
            region: "us-east-1".to_string(),
            cdn_base_url: cdn_base_url.into(),
            upload_prefix: "user-uploads".to_string(),
            upload_expiry: DEFAULT_UPLOAD_EXPIRY,
        }
    }
}

fn validate_base_url(raw: &str) -> StorageResult<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| StorageError::config_error(format!("CDN_BASE_URL is not a URL: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(StorageError::config_error("CDN_BASE_URL must be http(s)"));
    }
    Ok(())
}
