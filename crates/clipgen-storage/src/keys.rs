//! Object key layout for user uploads and CDN URLs.

use crate::error::{StorageError, StorageResult};

/// Longest sanitised filename kept in a key.
const MAX_FILENAME_LEN: usize = 128;

/// Prefix every upload of `user_id` must live under, with trailing slash.
pub fn user_upload_prefix(prefix: &str, user_id: &str) -> String {
    format!("{}/{}/", prefix.trim_end_matches('/'), user_id)
}

/// Default key for an upload: `{prefix}/{user}/{epochMs}-{filename}`.
pub fn default_upload_key(prefix: &str, user_id: &str, filename: &str, now_ms: i64) -> String {
    format!(
        "{}{}-{}",
        user_upload_prefix(prefix, user_id),
        now_ms,
        sanitize_filename(filename)
    )
}

/// Keep `[A-Za-z0-9._-]`, replace everything else with `_`.
///
/// Leading dots are stripped so the result can never be `.` or `..`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    let truncated: String = trimmed.chars().take(MAX_FILENAME_LEN).collect();
    if truncated.is_empty() {
        "upload".to_string()
    } else {
        truncated
    }
}

/// Check a client-chosen key stays inside the user's upload prefix.
pub fn validate_key_override(prefix: &str, user_id: &str, key: &str) -> StorageResult<()> {
    if key.is_empty() || key.len() > 1024 {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    let user_prefix = user_upload_prefix(prefix, user_id);
    if !key.starts_with(&user_prefix) || key.contains("..") || key.len() == user_prefix.len() {
        return Err(StorageError::KeyNotAllowed(key.to_string()));
    }
    Ok(())
}

/// Public URL of an object behind the CDN.
pub fn cdn_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key.trim_start_matches('/'))
}
