//! S3 client for pre-signed uploads.

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::keys::{cdn_url, default_upload_key, validate_key_override};

/// A pre-signed PUT handed to the browser.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub key: String,
    pub public_url: String,
    /// Seconds
    pub expires_in: u64,
}

/// Signs direct-to-bucket uploads.
#[derive(Clone)]
pub struct UploadClient {
    client: Client,
    config: StorageConfig,
}

impl UploadClient {
    pub fn new(client: Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    /// Client signing with fixed credentials, for local runs and tests.
    /// Signing is offline, so no bucket has to exist.
    pub fn with_static_credentials(
        config: StorageConfig,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "static");
        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .build();
        Self::new(Client::from_conf(sdk_config), config)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Public CDN URL for an object key.
    pub fn public_url(&self, key: &str) -> String {
        cdn_url(&self.config.cdn_base_url, key)
    }

    /// Pre-sign a PUT for a user upload.
    ///
    /// Without `key_override` the key is derived from the filename. An
    /// override must stay inside the user's prefix.
    pub async fn presign_upload(
        &self,
        user_id: &str,
        filename: &str,
        content_type: &str,
        key_override: Option<&str>,
        now_ms: i64,
    ) -> StorageResult<PresignedUpload> {
        let key = match key_override {
            Some(key) => {
                validate_key_override(&self.config.upload_prefix, user_id, key)?;
                key.to_string()
            }
            None => default_upload_key(&self.config.upload_prefix, user_id, filename, now_ms),
        };

        let presign_config = PresigningConfig::expires_in(self.config.upload_expiry)
            .map_err(|e| StorageError::presign_failed(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(&key)
            .content_type(content_type)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::presign_failed(e.to_string()))?;

        debug!(key = %key, "Pre-signed upload");

        Ok(PresignedUpload {
            upload_url: presigned.uri().to_string(),
            public_url: self.public_url(&key),
            key,
            expires_in: self.config.upload_expiry.as_secs(),
        })
    }
}
