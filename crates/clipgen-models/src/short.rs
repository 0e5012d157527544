//! Generated clips nested inside a job.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-clip status written by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShortStatus {
    #[default]
    Processing,
    Completed,
    Failed,
}

impl ShortStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShortStatus::Processing => "processing",
            ShortStatus::Completed => "completed",
            ShortStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processing" | "pending" => Some(ShortStatus::Processing),
            "completed" => Some(ShortStatus::Completed),
            "failed" => Some(ShortStatus::Failed),
            _ => None,
        }
    }
}

/// Stage timings reported by the pipeline, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingTime {
    pub ffmpeg: f64,
    pub upload: f64,
    pub total: f64,
}

/// One generated clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Short {
    pub id: String,
    pub status: ShortStatus,
    /// Timestamp into the source video (e.g. `00:01:05`)
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: f64,
    /// Opening line chosen by the pipeline
    pub hook: String,
    /// Object key of the rendered clip. Present iff `status == Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<ProcessingTime>,
}

impl Short {
    /// Enforce the `outputKey` iff `completed` invariant on records written
    /// by the pipeline. Returns `true` if a stray output key was dropped.
    pub fn normalize(&mut self) -> bool {
        if self.status != ShortStatus::Completed && self.output_key.is_some() {
            self.output_key = None;
            return true;
        }
        false
    }

    /// Whether the clip can be played or downloaded.
    pub fn is_playable(&self) -> bool {
        self.status == ShortStatus::Completed && self.output_key.is_some()
    }
}
