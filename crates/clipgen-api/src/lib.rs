//! Axum HTTP API for the clipgen shorts backend.
//!
//! This crate provides:
//! - Job submission onto the GenerateShorts event bus, with listing and detail
//! - YouTube metadata lookup with scrape and placeholder fallbacks
//! - Presets, credits, Stripe checkout and pre-signed uploads
//! - Google sign-in exchanged for HS256 session tokens
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::{ApiConfig, Backend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
