//! Shared data models for the clipgen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Shorts generation jobs and their nested clips
//! - Styling presets
//! - User records
//! - The event envelope handed to the processing pipeline
//! - YouTube URL parsing and video metadata

pub mod event;
pub mod job;
pub mod metadata;
pub mod preset;
pub mod short;
pub mod user;
pub mod utils;

// Re-export common types
pub use event::{EventEnvelope, GenerateShortsPayload, GENERATE_SHORTS_EVENT};
pub use job::{effective_status, Job, JobId, JobSettings, JobStatus, JobSummary};
pub use metadata::{MetadataSource, VideoMetadata};
pub use preset::{Preset, PresetId};
pub use short::{ProcessingTime, Short, ShortStatus};
pub use user::{User, AUTH_PROVIDER_GOOGLE};
pub use utils::{extract_youtube_video_id, is_youtube_url, now_millis, youtube_thumbnail_url};
