//! Event publishing error types.

use aws_sdk_eventbridge::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

pub type EventResult<T> = Result<T, EventError>;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event bus unavailable: {0}")]
    Transient(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Event rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EventError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn publish_failed(msg: impl Into<String>) -> Self {
        Self::PublishFailed(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EventError::Transient(_))
    }

    /// Classify a failed PutEvents call.
    pub(crate) fn from_sdk<E, R>(err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug,
    {
        let message = DisplayErrorContext(&err).to_string();
        let transient = match &err {
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
                true
            }
            SdkError::ServiceError(service) => matches!(
                service.err().code(),
                Some("ThrottlingException" | "InternalException" | "InternalFailure")
            ),
            _ => false,
        };

        if transient {
            Self::Transient(message)
        } else {
            Self::PublishFailed(message)
        }
    }

    /// Classify a per-entry failure reported in a successful PutEvents response.
    pub(crate) fn from_entry(code: Option<&str>, message: Option<&str>) -> Self {
        let code = code.unwrap_or("Unknown").to_string();
        let message = message.unwrap_or("entry not accepted").to_string();
        match code.as_str() {
            "ThrottlingException" | "InternalFailure" | "InternalException" => {
                Self::Transient(format!("{}: {}", code, message))
            }
            _ => Self::Rejected { code, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_classification() {
        assert!(EventError::from_entry(Some("ThrottlingException"), None).is_retryable());
        assert!(EventError::from_entry(Some("InternalFailure"), Some("boom")).is_retryable());

        let rejected = EventError::from_entry(Some("MalformedDetail"), Some("bad json"));
        assert!(!rejected.is_retryable());
        assert!(rejected.to_string().contains("MalformedDetail"));
    }
}
