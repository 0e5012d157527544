//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Install the Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "clipgen_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "clipgen_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "clipgen_http_requests_in_flight";

    pub const JOBS_SUBMITTED_TOTAL: &str = "clipgen_jobs_submitted_total";
    pub const JOBS_DISPATCH_FAILED_TOTAL: &str = "clipgen_jobs_dispatch_failed_total";
    pub const METADATA_LOOKUPS_TOTAL: &str = "clipgen_metadata_lookups_total";
    pub const PRESETS_CREATED_TOTAL: &str = "clipgen_presets_created_total";
    pub const CHECKOUT_SESSIONS_TOTAL: &str = "clipgen_checkout_sessions_total";
    pub const UPLOADS_PRESIGNED_TOTAL: &str = "clipgen_uploads_presigned_total";
    pub const SIGN_INS_TOTAL: &str = "clipgen_sign_ins_total";

    pub const RATE_LIMIT_HITS_TOTAL: &str = "clipgen_rate_limit_hits_total";
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_job_submitted(composition_id: &str) {
    let labels = [("composition", composition_id.to_string())];
    counter!(names::JOBS_SUBMITTED_TOTAL, &labels).increment(1);
}

pub fn record_job_dispatch_failed() {
    counter!(names::JOBS_DISPATCH_FAILED_TOTAL).increment(1);
}

/// Record a metadata lookup by the source that answered it.
pub fn record_metadata_lookup(source: &str) {
    let labels = [("source", source.to_string())];
    counter!(names::METADATA_LOOKUPS_TOTAL, &labels).increment(1);
}

pub fn record_preset_created() {
    counter!(names::PRESETS_CREATED_TOTAL).increment(1);
}

pub fn record_checkout_session(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::CHECKOUT_SESSIONS_TOTAL, &labels).increment(1);
}

pub fn record_upload_presigned() {
    counter!(names::UPLOADS_PRESIGNED_TOTAL).increment(1);
}

pub fn record_sign_in(new_user: bool) {
    let labels = [("new_user", new_user.to_string())];
    counter!(names::SIGN_INS_TOTAL, &labels).increment(1);
}

pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("valid uuid pattern")
});

static NUMERIC_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[0-9]+(/|$)").expect("valid numeric pattern"));

static JOB_DETAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/generate-shorts-jobs/[^/]+").expect("valid job detail pattern")
});

/// Collapse ids in a path so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let path = UUID_RE.replace_all(path, ":id");
    let path = NUMERIC_SEGMENT_RE.replace_all(&path, "/:id$1");
    let path = JOB_DETAIL_RE.replace_all(&path, "/generate-shorts-jobs/:id");
    path.into_owned()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
