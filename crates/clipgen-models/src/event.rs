//! Events handed to the external shorts pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Detail type of the job dispatch event.
pub const GENERATE_SHORTS_EVENT: &str = "GenerateShorts";

pub const DEFAULT_MAX_SHORTS: u32 = 3;
pub const DEFAULT_MAX_DURATION: u32 = 60;

/// Envelope pairing an event type with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<T> {
    pub event_type: String,
    pub payload: T,
}

impl<T> EventEnvelope<T> {
    pub fn new(event_type: impl Into<String>, payload: T) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Payload of a `GenerateShorts` event. `request_id` is the job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateShortsPayload {
    pub request_id: String,
    pub url: String,
    pub user_id: String,
    pub composition_id: String,
    /// Object key of uploaded cookies for gated videos; serialized as `null` when absent
    pub cookies_key: Option<String>,
    pub max_shorts: u32,
    /// Seconds
    pub max_duration: u32,
}

impl GenerateShortsPayload {
    pub fn new(
        request_id: impl Into<String>,
        url: impl Into<String>,
        user_id: impl Into<String>,
        composition_id: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            url: url.into(),
            user_id: user_id.into(),
            composition_id: composition_id.into(),
            cookies_key: None,
            max_shorts: DEFAULT_MAX_SHORTS,
            max_duration: DEFAULT_MAX_DURATION,
        }
    }

    pub fn with_cookies_key(mut self, key: Option<String>) -> Self {
        self.cookies_key = key;
        self
    }

    pub fn with_max_shorts(mut self, max_shorts: Option<u32>) -> Self {
        if let Some(n) = max_shorts {
            self.max_shorts = n;
        }
        self
    }

    pub fn with_max_duration(mut self, max_duration: Option<u32>) -> Self {
        if let Some(n) = max_duration {
            self.max_duration = n;
        }
        self
    }

    /// Wrap in the dispatch envelope.
    pub fn into_envelope(self) -> EventEnvelope<Self> {
        EventEnvelope::new(GENERATE_SHORTS_EVENT, self)
    }
}
