//! YouTube metadata lookup and job backfill.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use clipgen_models::{extract_youtube_video_id, JobId, VideoMetadata};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::non_blank;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    pub url: Option<String>,
}

/// Public metadata lookup for a YouTube URL.
pub async fn get_video_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> ApiResult<Json<VideoMetadata>> {
    let url = non_blank(query.url.as_deref())
        .ok_or_else(|| ApiError::bad_request("URL parameter is required"))?;
    let video_id =
        extract_youtube_video_id(url).ok_or_else(|| ApiError::bad_request("Invalid YouTube URL"))?;

    let meta = state.youtube.video_details(&video_id).await;
    metrics::record_metadata_lookup(meta.source.as_str());
    Ok(Json(meta))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillRequest {
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillResponse {
    pub success: bool,
    pub message: String,
    pub video_title: String,
    pub thumbnail_url: String,
}

/// Fill in title and thumbnail on one of the caller's jobs.
pub async fn backfill_video_metadata(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<BackfillRequest>,
) -> ApiResult<Json<BackfillResponse>> {
    let job_id = non_blank(req.job_id.as_deref())
        .map(JobId::from_string)
        .ok_or_else(|| ApiError::bad_request("Job ID is required"))?;

    let job = state
        .jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;
    if !job.is_owned_by(&user.user_id) {
        return Err(ApiError::forbidden("Access denied"));
    }

    let video_id = extract_youtube_video_id(&job.source_url)
        .ok_or_else(|| ApiError::bad_request("Job source URL is not a YouTube URL"))?;

    let meta = state.youtube.video_details(&video_id).await;
    metrics::record_metadata_lookup(meta.source.as_str());

    let video_title = meta.title_or_placeholder();
    state
        .jobs
        .update_video_metadata(&job_id, &video_title, &meta.thumbnail)
        .await?;

    info!(job_id = %job_id, source = meta.source.as_str(), "Backfilled video metadata");

    Ok(Json(BackfillResponse {
        success: true,
        message: "Thumbnail updated".to_string(),
        video_title,
        thumbnail_url: meta.thumbnail,
    }))
}
