//! HTTP handlers.

pub mod auth;
pub mod billing;
pub mod credits;
pub mod health;
pub mod jobs;
pub mod metadata;
pub mod presets;
pub mod uploads;

/// `Some(trimmed)` when the field is present and not blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
