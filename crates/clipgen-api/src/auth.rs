//! Google sign-in and session tokens.
//!
//! Google ID tokens are verified against Google's JWKS. A verified sign-in
//! is exchanged for an HS256 session token whose `sub` is the user id.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::http_client;
use crate::state::AppState;

pub const DEFAULT_GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Minimum gap between refreshes triggered by an unknown key id.
const JWKS_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

/// Name of the cookie carrying a session token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub google_client_id: String,
    pub google_jwks_url: String,
    pub session_secret: String,
    pub session_ttl: Duration,
}

impl AuthConfig {
    /// `session_secret` is resolved separately since it may live in SSM.
    /// Without one, production startup fails and other environments get a
    /// per-process random secret.
    pub fn from_env(session_secret: Option<String>, is_production: bool) -> anyhow::Result<Self> {
        let session_secret = match session_secret.filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if is_production => anyhow::bail!("SESSION_SECRET must be set in production"),
            None => {
                warn!("SESSION_SECRET not set, sessions will not survive a restart");
                format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
            }
        };

        Ok(Self {
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_jwks_url: std::env::var("GOOGLE_JWKS_URL")
                .unwrap_or_else(|_| DEFAULT_GOOGLE_JWKS_URL.to_string()),
            session_secret,
            session_ttl: std::env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SESSION_TTL),
        })
    }
}

/// Claims of a verified Google ID token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleClaims {
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> ApiResult<GoogleClaims>;
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

#[derive(Debug, Deserialize)]
struct JwkKey {
    kid: String,
    n: String,
    e: String,
}

/// Verifies Google ID tokens with a lazily refreshed JWKS cache.
pub struct GoogleJwksVerifier {
    http: reqwest::Client,
    jwks_url: String,
    client_id: String,
    keys: RwLock<HashMap<String, DecodingKey>>,
    last_refresh: RwLock<Option<Instant>>,
}

impl GoogleJwksVerifier {
    pub fn new(config: &AuthConfig) -> reqwest::Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_secs(10))?,
            jwks_url: config.google_jwks_url.clone(),
            client_id: config.google_client_id.clone(),
            keys: RwLock::new(HashMap::new()),
            last_refresh: RwLock::new(None),
        })
    }

    async fn refresh_keys(&self) -> Result<(), String> {
        debug!(url = %self.jwks_url, "Refreshing Google JWKS");

        let jwks: JwksResponse = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?
            .json()
            .await
            .map_err(|e| e.to_string())?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => warn!(kid = %jwk.kid, "Skipping unusable JWK: {}", e),
            }
        }

        debug!("Loaded {} JWKS keys", keys.len());
        *self.keys.write().await = keys;
        *self.last_refresh.write().await = Some(Instant::now());
        Ok(())
    }

    async fn get_key(&self, kid: &str) -> Option<DecodingKey> {
        let since_refresh = self.last_refresh.read().await.map(|t| t.elapsed());
        let stale = since_refresh.map_or(true, |age| age > JWKS_CACHE_TTL);
        let known = self.keys.read().await.contains_key(kid);
        // Google rotates keys, so an unknown kid may just be newer than the cache
        let may_refetch = since_refresh.map_or(true, |age| age > JWKS_MIN_REFRESH_INTERVAL);

        if stale || (!known && may_refetch) {
            if let Err(e) = self.refresh_keys().await {
                warn!("Failed to refresh JWKS keys: {}", e);
            }
        }

        self.keys.read().await.get(kid).cloned()
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleJwksVerifier {
    async fn verify(&self, id_token: &str) -> ApiResult<GoogleClaims> {
        if self.client_id.is_empty() {
            return Err(ApiError::internal("Google sign-in is not configured"));
        }

        let header = decode_header(id_token)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token header: {}", e)))?;
        let kid = header
            .kid
            .ok_or_else(|| ApiError::unauthorized("Token missing key ID"))?;
        let key = self
            .get_key(&kid)
            .await
            .ok_or_else(|| ApiError::unauthorized("Unknown key ID"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_audience(&[&self.client_id]);

        let data = decode::<GoogleClaims>(id_token, &key, &validation)
            .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {}", e)))?;
        Ok(data.claims)
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.session_secret.as_bytes(), config.session_ttl)
    }

    pub fn issue(&self, user_id: &str, email: &str) -> ApiResult<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign session: {}", e)))
    }

    pub fn verify(&self, token: &str) -> ApiResult<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| ApiError::unauthorized(format!("Invalid session: {}", e)))
    }
}

/// Authenticated session user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

impl From<SessionClaims> for AuthUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Session token from the bearer header, else the session cookie.
fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
        let claims = state.sessions.verify(&token)?;
        Ok(AuthUser::from(claims))
    }
}
