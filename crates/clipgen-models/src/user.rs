//! User accounts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::now_millis;

/// Provider tag for accounts created through Google sign-in.
pub const AUTH_PROVIDER_GOOGLE: &str = "google";

/// User record in the users table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Epoch milliseconds
    pub created_at: i64,
    pub provider: String,
    /// Remaining generation credits, maintained by billing reconciliation.
    #[serde(default)]
    pub credits: i64,
}

impl User {
    /// New account from a verified Google identity.
    pub fn from_google(
        id: impl Into<String>,
        email: impl Into<String>,
        name: Option<String>,
        image: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name,
            image,
            created_at: now_millis(),
            provider: AUTH_PROVIDER_GOOGLE.to_string(),
            credits: 0,
        }
    }
}
