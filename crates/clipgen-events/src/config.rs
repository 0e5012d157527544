//! Event bus configuration.

use crate::retry::RetryConfig;

#[derive(Debug, Clone)]
pub struct EventsConfig {
    /// Target bus
    pub event_bus_name: String,
    /// `Source` field of published entries
    pub source: String,
    pub retry: RetryConfig,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            event_bus_name: "ServiceEventBus".to_string(),
            source: "client-service".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl EventsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            event_bus_name: std::env::var("EVENT_BUS_NAME")
                .unwrap_or_else(|_| "ServiceEventBus".to_string()),
            source: std::env::var("EVENT_SOURCE").unwrap_or_else(|_| "client-service".to_string()),
            retry: RetryConfig::from_env(),
        }
    }
}
