//! Job submission, listing and detail handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use clipgen_events::publish_envelope;
use clipgen_models::{
    GenerateShortsPayload, Job, JobId, JobSettings, JobStatus, JobSummary, ProcessingTime, Short,
    ShortStatus,
};
use clipgen_storage::validate_key_override;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::non_blank;
use crate::metrics;
use crate::security::validate_source_url;
use crate::state::AppState;

pub const MAX_SHORTS_LIMIT: u32 = 10;

/// Written to a job whose event could not be published.
pub const DISPATCH_FAILED_MESSAGE: &str = "Failed to dispatch job";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateShortsRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub settings: Option<JobSettings>,
    #[serde(default)]
    pub composition_id: Option<String>,
    #[serde(default)]
    pub cookies_key: Option<String>,
    #[serde(default)]
    pub max_shorts: Option<u32>,
    #[serde(default)]
    pub max_duration: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateShortsResponse {
    pub success: bool,
    pub request_id: String,
    pub message: String,
}

/// Create a job and hand it to the pipeline.
///
/// The job row is written before the event is published. If publishing
/// fails after retries the row is marked FAILED so it never sits in
/// PROCESSING without a consumer.
pub async fn generate_shorts(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<GenerateShortsRequest>,
) -> ApiResult<Json<GenerateShortsResponse>> {
    let url = non_blank(req.url.as_deref()).ok_or_else(|| ApiError::bad_request("URL is required"))?;
    let url = validate_source_url(url).map_err(ApiError::BadRequest)?;

    let composition_id = non_blank(req.composition_id.as_deref())
        .ok_or_else(|| ApiError::bad_request("compositionId is required"))?
        .to_string();

    if let Some(n) = req.max_shorts {
        if !(1..=MAX_SHORTS_LIMIT).contains(&n) {
            return Err(ApiError::bad_request(format!(
                "maxShorts must be between 1 and {}",
                MAX_SHORTS_LIMIT
            )));
        }
    }
    if req.max_duration == Some(0) {
        return Err(ApiError::bad_request("maxDuration must be greater than 0"));
    }

    let cookies_key = non_blank(req.cookies_key.as_deref()).map(str::to_string);
    if let Some(key) = &cookies_key {
        validate_key_override(&state.uploads.config().upload_prefix, &user.user_id, key)?;
    }

    let job = Job::new_processing(&user.user_id, &url, &composition_id, req.settings);
    state.jobs.create(&job).await?;

    let envelope = GenerateShortsPayload::new(job.id.as_str(), &url, &user.user_id, &composition_id)
        .with_cookies_key(cookies_key)
        .with_max_shorts(req.max_shorts)
        .with_max_duration(req.max_duration)
        .into_envelope();

    if let Err(e) = publish_envelope(state.events.as_ref(), &envelope).await {
        metrics::record_job_dispatch_failed();
        if let Err(mark_err) = state.jobs.mark_failed(&job.id, DISPATCH_FAILED_MESSAGE).await {
            error!(job_id = %job.id, "Failed to mark undispatched job as failed: {}", mark_err);
        }
        return Err(e.into());
    }

    metrics::record_job_submitted(&composition_id);
    info!(
        job_id = %job.id,
        user_id = %user.user_id,
        composition_id = %composition_id,
        "Shorts generation started"
    );

    Ok(Json(GenerateShortsResponse {
        success: true,
        request_id: job.id.to_string(),
        message: "Shorts generation started".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobSummary>,
}

/// The caller's jobs, newest first. A `userId` filter must name the caller.
pub async fn list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<ListJobsResponse>> {
    if let Some(requested) = non_blank(query.user_id.as_deref()) {
        if requested != user.user_id {
            return Err(ApiError::forbidden("Cannot list jobs of another user"));
        }
    }

    let jobs = state.jobs.list_by_user(&user.user_id).await?;
    Ok(Json(ListJobsResponse { jobs }))
}

/// A short as returned to the client, with a playable URL in place of
/// the object key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortView {
    pub id: String,
    pub status: ShortStatus,
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: f64,
    pub hook: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<ProcessingTime>,
}

impl ShortView {
    fn from_short(short: Short, state: &AppState) -> Self {
        let output_url = short
            .output_key
            .as_deref()
            .filter(|_| short.is_playable())
            .map(|key| state.uploads.public_url(key));
        Self {
            id: short.id,
            status: short.status,
            start_time: short.start_time,
            end_time: short.end_time,
            duration_seconds: short.duration_seconds,
            hook: short.hook,
            output_url,
            completed_at: short.completed_at,
            confidence: short.confidence,
            processing_time: short.processing_time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetailResponse {
    pub id: JobId,
    pub user_id: String,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub status: JobStatus,
    pub effective_status: &'static str,
    pub settings: Option<JobSettings>,
    pub shorts: Vec<ShortView>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Full job record for its owner.
pub async fn get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobDetailResponse>> {
    let job = state
        .jobs
        .get(&JobId::from_string(job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if !job.is_owned_by(&user.user_id) {
        return Err(ApiError::forbidden("Access denied"));
    }

    let effective_status = job.effective_status();
    Ok(Json(JobDetailResponse {
        shorts: job
            .shorts
            .into_iter()
            .map(|s| ShortView::from_short(s, &state))
            .collect(),
        id: job.id,
        user_id: job.user_id,
        source_url: job.source_url,
        composition_id: job.composition_id,
        video_title: job.video_title,
        thumbnail_url: job.thumbnail_url,
        status: job.status,
        effective_status,
        settings: job.settings,
        created_at: job.created_at,
        updated_at: job.updated_at,
        completed_at: job.completed_at,
        error_message: job.error_message,
    }))
}
