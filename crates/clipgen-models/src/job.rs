//! Shorts generation job records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::short::{Short, ShortStatus};
use crate::utils::now_millis;

/// Unique identifier for a job. Doubles as the `requestId` of the
/// `GenerateShorts` event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Job lifecycle status as stored in the jobs table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Submitted and handed to the pipeline
    #[default]
    Processing,
    /// Pipeline finished every short
    Completed,
    /// Pipeline (or dispatch) failed
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Parse a stored status. Case-insensitive since the pipeline is an
    /// external writer.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROCESSING" => Some(JobStatus::Processing),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Styling settings chosen in the wizard. Every field is optional and is
/// stored as `NULL` when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobSettings {
    #[serde(default)]
    pub caption_style: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub background_style: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub caption_color: Option<String>,
    #[serde(default)]
    pub caption_size: Option<String>,
    #[serde(default)]
    pub caption_position: Option<String>,
    /// Target clip length in seconds
    #[serde(default)]
    pub clip_duration: Option<f64>,
    #[serde(default)]
    pub preset_id: Option<String>,
}

/// A shorts generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,

    /// Owner
    pub user_id: String,

    /// Long-form source video
    pub source_url: String,

    /// Render composition used by the pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    pub status: JobStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<JobSettings>,

    /// Clips written back by the pipeline
    #[serde(default)]
    pub shorts: Vec<Short>,

    /// Epoch milliseconds
    pub created_at: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,

    /// Set by the pipeline when the job finishes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Job {
    /// Create a freshly submitted job in PROCESSING state.
    pub fn new_processing(
        user_id: impl Into<String>,
        source_url: impl Into<String>,
        composition_id: impl Into<String>,
        settings: Option<JobSettings>,
    ) -> Self {
        Self {
            id: JobId::new(),
            user_id: user_id.into(),
            source_url: source_url.into(),
            composition_id: Some(composition_id.into()),
            video_title: None,
            thumbnail_url: None,
            status: JobStatus::Processing,
            settings,
            shorts: Vec::new(),
            created_at: now_millis(),
            updated_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Overall status shown to the owner.
    ///
    /// The job's own status wins. Legacy records without one fall back to
    /// the state of their shorts.
    pub fn effective_status(&self) -> &'static str {
        effective_status(Some(self.status), &self.shorts)
    }

    /// Lightweight listing view.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            source_url: self.source_url.clone(),
            status: self.status,
            video_title: self.video_title.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Derive an overall status from an optional job status and its shorts.
pub fn effective_status(status: Option<JobStatus>, shorts: &[Short]) -> &'static str {
    if let Some(status) = status {
        return match status {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
    }

    if shorts.iter().any(|s| s.status == ShortStatus::Failed) {
        return "failed";
    }
    if shorts.iter().any(|s| s.status == ShortStatus::Processing) {
        return "processing";
    }
    if !shorts.is_empty() && shorts.iter().all(|s| s.status == ShortStatus::Completed) {
        return "completed";
    }
    "processing"
}

/// Job fields returned by the listing route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: JobId,
    pub user_id: String,
    pub source_url: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub created_at: i64,
}
