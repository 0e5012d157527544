//! Pre-signed source video uploads.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use clipgen_models::now_millis;
use clipgen_storage::PresignedUpload;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::non_blank;
use crate::metrics;
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub key_override: Option<String>,
}

pub async fn generate_video_upload(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<UploadRequest>,
) -> ApiResult<Json<PresignedUpload>> {
    let key_override = non_blank(req.key_override.as_deref());
    let filename = non_blank(req.filename.as_deref());
    if filename.is_none() && key_override.is_none() {
        return Err(ApiError::bad_request("filename is required"));
    }
    let content_type = non_blank(req.content_type.as_deref()).unwrap_or(DEFAULT_CONTENT_TYPE);

    let upload = state
        .uploads
        .presign_upload(
            &user.user_id,
            filename.unwrap_or_default(),
            content_type,
            key_override,
            now_millis(),
        )
        .await?;

    metrics::record_upload_presigned();
    info!(user_id = %user.user_id, key = %upload.key, "Presigned upload");
    Ok(Json(upload))
}
