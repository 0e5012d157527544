//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::auth::{get_session, google_sign_in};
use crate::handlers::billing::create_checkout_session;
use crate::handlers::credits::get_user_credits;
use crate::handlers::health::{health, ready};
use crate::handlers::jobs::{generate_shorts, get_job, list_jobs};
use crate::handlers::metadata::{backfill_video_metadata, get_video_metadata};
use crate::handlers::presets::{create_preset, list_presets};
use crate::handlers::uploads::generate_video_upload;
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/generate-shorts", post(generate_shorts))
        .route("/list-generate-shorts-jobs", get(list_jobs))
        .route("/generate-shorts-jobs/:id", get(get_job));

    let metadata_routes = Router::new()
        .route("/get-video-metadata", get(get_video_metadata))
        .route("/backfill-video-metadata", post(backfill_video_metadata));

    let account_routes = Router::new()
        .route("/create-preset", post(create_preset))
        .route("/list-presets", get(list_presets))
        .route("/get-user-credits", get(get_user_credits))
        .route("/payment/create-checkout-session", post(create_checkout_session))
        .route("/generate-video-upload", post(generate_video_upload));

    let auth_routes = Router::new()
        .route("/auth/google", post(google_sign_in))
        .route("/auth/session", get(get_session));

    let rate_limiter = RateLimiterCache::new(state.config.rate_limit_rps);

    let api_routes = Router::new()
        .merge(job_routes)
        .merge(metadata_routes)
        .merge(account_routes)
        .merge(auth_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
