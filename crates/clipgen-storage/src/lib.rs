//! Object storage for the clipgen backend.
//!
//! Browsers upload source videos and cookie files straight to S3 through
//! pre-signed PUT URLs. Rendered shorts are served from a CDN.

pub mod client;
pub mod config;
pub mod error;
pub mod keys;

pub use client::{PresignedUpload, UploadClient};
pub use config::{StorageConfig, DEFAULT_UPLOAD_EXPIRY};
pub use error::{StorageError, StorageResult};
pub use keys::{cdn_url, sanitize_filename, user_upload_prefix, validate_key_override};
