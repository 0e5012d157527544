//! Event publishers.

use async_trait::async_trait;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use aws_sdk_eventbridge::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use clipgen_models::EventEnvelope;

use crate::config::EventsConfig;
use crate::error::{EventError, EventResult};
use crate::metrics::{record_failed, record_published};
use crate::retry::{with_retry, RetryConfig};

/// Publishes events to the pipeline.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event. `detail` is the JSON-encoded payload.
    async fn publish(&self, detail_type: &str, detail: &str) -> EventResult<()>;
}

/// Serialize an envelope and publish its payload under its event type.
pub async fn publish_envelope<T>(
    publisher: &dyn EventPublisher,
    envelope: &EventEnvelope<T>,
) -> EventResult<()>
where
    T: Serialize + Sync,
{
    let detail = serde_json::to_string(&envelope.payload)?;
    let result = publisher.publish(&envelope.event_type, &detail).await;
    match &result {
        Ok(()) => record_published(&envelope.event_type),
        Err(e) => {
            record_failed(&envelope.event_type);
            error!(event_type = %envelope.event_type, "Failed to publish event: {}", e);
        }
    }
    result
}

/// EventBridge `PutEvents` publisher.
#[derive(Clone)]
pub struct EventBridgePublisher {
    client: Client,
    event_bus_name: String,
    source: String,
    retry: RetryConfig,
}

impl EventBridgePublisher {
    pub fn new(client: Client, config: EventsConfig) -> Self {
        Self {
            client,
            event_bus_name: config.event_bus_name,
            source: config.source,
            retry: config.retry,
        }
    }

    async fn put_once(&self, detail_type: &str, detail: &str) -> EventResult<()> {
        let entry = PutEventsRequestEntry::builder()
            .source(&self.source)
            .detail_type(detail_type)
            .detail(detail)
            .event_bus_name(&self.event_bus_name)
            .build();

        let output = self
            .client
            .put_events()
            .entries(entry)
            .send()
            .await
            .map_err(EventError::from_sdk)?;

        if output.failed_entry_count() > 0 {
            let failed = output.entries().iter().find(|e| e.error_code().is_some());
            return Err(EventError::from_entry(
                failed.and_then(|e| e.error_code()),
                failed.and_then(|e| e.error_message()),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl EventPublisher for EventBridgePublisher {
    async fn publish(&self, detail_type: &str, detail: &str) -> EventResult<()> {
        with_retry(&self.retry, "PutEvents", || self.put_once(detail_type, detail)).await?;
        info!(
            detail_type = %detail_type,
            event_bus = %self.event_bus_name,
            "Published event"
        );
        Ok(())
    }
}

/// A published event captured by [`RecordingPublisher`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub detail_type: String,
    pub detail: serde_json::Value,
}

/// In-memory publisher for local runs and tests.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<RecordedEvent>>,
    fail_with: Option<String>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every publish fails with a non-retryable error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            events: Mutex::default(),
            fail_with: Some(message.into()),
        }
    }

    pub async fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, detail_type: &str, detail: &str) -> EventResult<()> {
        if let Some(message) = &self.fail_with {
            return Err(EventError::publish_failed(message.clone()));
        }
        let detail = serde_json::from_str(detail)?;
        self.events.lock().await.push(RecordedEvent {
            detail_type: detail_type.to_string(),
            detail,
        });
        Ok(())
    }
}
