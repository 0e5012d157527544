//! DynamoDB metrics collection.

use std::future::Future;
use std::time::Instant;

use metrics::{counter, histogram};

use crate::error::StoreResult;

/// Metric name constants.
pub mod names {
    /// Total DynamoDB requests by operation and outcome.
    pub const REQUESTS_TOTAL: &str = "dynamodb_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "dynamodb_latency_seconds";
}

/// Record metrics for a completed DynamoDB request.
pub fn record_request(operation: &'static str, outcome: &'static str, latency_secs: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);

    histogram!(names::LATENCY_SECONDS, "operation" => operation).record(latency_secs);
}

/// Run a repository call and record its outcome and latency.
pub(crate) async fn observe<T, F>(operation: &'static str, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    let outcome = if result.is_ok() { "ok" } else { "error" };
    record_request(operation, outcome, start.elapsed().as_secs_f64());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
    }
}
