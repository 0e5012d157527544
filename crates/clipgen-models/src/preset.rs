//! Saved styling presets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::utils::now_millis;

/// Unique identifier for a preset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PresetId(pub String);

impl PresetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PresetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named bundle of composition input props (captions, title, background).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: PresetId,
    pub user_id: String,
    pub composition_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form styling parameters passed through to the composition.
    pub input_props: serde_json::Value,
    /// Epoch milliseconds
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Preset {
    pub fn new(
        user_id: impl Into<String>,
        composition_id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        input_props: serde_json::Value,
    ) -> Self {
        let now = now_millis();
        Self {
            id: PresetId::new(),
            user_id: user_id.into(),
            composition_id: composition_id.into(),
            name: name.into(),
            description: description.unwrap_or_default(),
            input_props,
            created_at: now,
            updated_at: Some(now),
        }
    }
}
