//! Shared harness: the real router over in-memory backends.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use clipgen_api::auth::{GoogleClaims, IdTokenVerifier, SessionKeys, DEFAULT_SESSION_TTL};
use clipgen_api::services::{StripeClient, StripeConfig, YoutubeClient, YoutubeConfig};
use clipgen_api::{create_router, ApiConfig, ApiError, ApiResult, AppState, Backend};
use clipgen_events::RecordingPublisher;
use clipgen_storage::{StorageConfig, UploadClient};
use clipgen_store::{InMemoryJobRepository, InMemoryPresetRepository, InMemoryUserRepository};

pub const CDN: &str = "https://cdn.example.com";

/// Nothing listens here, so outbound calls fail fast.
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Accepts tokens registered with [`StubVerifier::with`].
#[derive(Default)]
pub struct StubVerifier {
    tokens: HashMap<String, GoogleClaims>,
}

impl StubVerifier {
    pub fn with(self, token: &str, sub: &str, email: Option<&str>) -> Self {
        self.with_claims(token, sub, email, Some(true))
    }

    /// A token whose email Google has not verified.
    pub fn with_unverified(self, token: &str, sub: &str, email: &str) -> Self {
        self.with_claims(token, sub, Some(email), Some(false))
    }

    fn with_claims(
        mut self,
        token: &str,
        sub: &str,
        email: Option<&str>,
        email_verified: Option<bool>,
    ) -> Self {
        self.tokens.insert(
            token.to_string(),
            GoogleClaims {
                sub: sub.to_string(),
                email: email.map(str::to_string),
                email_verified,
                name: Some("Test User".to_string()),
                picture: None,
                iss: "https://accounts.google.com".to_string(),
                aud: "test-client".to_string(),
                iat: 0,
                exp: i64::MAX,
            },
        );
        self
    }
}

#[async_trait]
impl IdTokenVerifier for StubVerifier {
    async fn verify(&self, id_token: &str) -> ApiResult<GoogleClaims> {
        self.tokens
            .get(id_token)
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Token validation failed"))
    }
}

pub struct TestAppBuilder {
    publisher: RecordingPublisher,
    youtube: YoutubeConfig,
    stripe: StripeConfig,
    verifier: StubVerifier,
    rate_limit_rps: u32,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            publisher: RecordingPublisher::new(),
            youtube: YoutubeConfig {
                api_key: None,
                api_base_url: UNREACHABLE.to_string(),
                watch_base_url: UNREACHABLE.to_string(),
                timeout: Duration::from_secs(2),
            },
            stripe: StripeConfig {
                secret_key: Some("sk_test_123".to_string()),
                api_base_url: UNREACHABLE.to_string(),
                timeout: Duration::from_secs(2),
            },
            verifier: StubVerifier::default(),
            rate_limit_rps: 1000,
        }
    }
}

impl TestAppBuilder {
    pub fn publisher(mut self, publisher: RecordingPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn youtube(mut self, config: YoutubeConfig) -> Self {
        self.youtube = config;
        self
    }

    pub fn stripe_base_url(mut self, base_url: &str) -> Self {
        self.stripe.api_base_url = base_url.to_string();
        self
    }

    pub fn verifier(mut self, verifier: StubVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn rate_limit(mut self, rps: u32) -> Self {
        self.rate_limit_rps = rps;
        self
    }

    pub fn build(self) -> TestApp {
        let config = ApiConfig {
            backend: Backend::Memory,
            app_url: "https://app.example.com".to_string(),
            rate_limit_rps: self.rate_limit_rps,
            ..Default::default()
        };

        let jobs = Arc::new(InMemoryJobRepository::new());
        let presets = Arc::new(InMemoryPresetRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let events = Arc::new(self.publisher);
        let sessions = Arc::new(SessionKeys::new(b"test-session-secret", DEFAULT_SESSION_TTL));

        let state = AppState {
            config,
            jobs: jobs.clone(),
            presets: presets.clone(),
            users: users.clone(),
            events: events.clone(),
            uploads: Arc::new(UploadClient::with_static_credentials(
                StorageConfig::local(CDN),
                "test-access-key",
                "test-secret-key",
            )),
            youtube: Arc::new(YoutubeClient::new(self.youtube).unwrap()),
            stripe: Arc::new(StripeClient::new(self.stripe).unwrap()),
            id_tokens: Arc::new(self.verifier),
            sessions: sessions.clone(),
        };

        TestApp {
            router: create_router(state, None),
            jobs,
            presets,
            users,
            events,
            sessions,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub jobs: Arc<InMemoryJobRepository>,
    pub presets: Arc<InMemoryPresetRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub events: Arc<RecordingPublisher>,
    pub sessions: Arc<SessionKeys>,
}

impl TestApp {
    pub fn new() -> Self {
        TestAppBuilder::default().build()
    }

    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    /// A session token for `user_id`.
    pub fn token(&self, user_id: &str) -> String {
        self.sessions
            .issue(user_id, &format!("{user_id}@example.com"))
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, user.map(|u| self.token(u)), None))
            .await
    }

    pub async fn post(&self, uri: &str, user: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, user.map(|u| self.token(u)), Some(body)))
            .await
    }
}

pub fn request(method: Method, uri: &str, token: Option<String>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
