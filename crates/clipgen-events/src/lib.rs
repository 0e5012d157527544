//! Event bus publishing for the clipgen backend.
//!
//! Jobs are handed to the external shorts pipeline as `GenerateShorts`
//! events on EventBridge. Transient failures are retried with backoff.

pub mod config;
pub mod error;
pub mod metrics;
pub mod publisher;
pub mod retry;

pub use config::EventsConfig;
pub use error::{EventError, EventResult};
pub use publisher::{
    publish_envelope, EventBridgePublisher, EventPublisher, RecordedEvent, RecordingPublisher,
};
pub use retry::{with_retry, RetryConfig};
