//! Event publishing metrics.

use metrics::counter;

pub mod names {
    /// Events accepted by the bus, by detail type.
    pub const EVENTS_PUBLISHED_TOTAL: &str = "events_published_total";

    /// Events that could not be published, by detail type.
    pub const EVENTS_FAILED_TOTAL: &str = "events_failed_total";

    /// Publish retry attempts.
    pub const RETRIES_TOTAL: &str = "events_publish_retries_total";
}

pub fn record_published(detail_type: &str) {
    counter!(names::EVENTS_PUBLISHED_TOTAL, "detail_type" => detail_type.to_string()).increment(1);
}

pub fn record_failed(detail_type: &str) {
    counter!(names::EVENTS_FAILED_TOTAL, "detail_type" => detail_type.to_string()).increment(1);
}

pub fn record_retry(operation: &str) {
    counter!(names::RETRIES_TOTAL, "operation" => operation.to_string()).increment(1);
}
