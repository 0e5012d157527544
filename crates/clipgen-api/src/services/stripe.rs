//! Minimal Stripe REST client for subscription checkout.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::http_client;

pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

#[derive(Debug, Error)]
pub enum StripeError {
    #[error("Stripe is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub api_base_url: String,
    pub timeout: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl StripeConfig {
    pub fn from_env(secret_key: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            secret_key: secret_key.filter(|k| !k.trim().is_empty()),
            api_base_url: std::env::var("STRIPE_API_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            timeout: defaults.timeout,
        }
    }
}

/// A created checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    #[serde(rename = "sessionId", alias = "id")]
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceList {
    #[serde(default)]
    data: Vec<Price>,
}

#[derive(Debug, Deserialize)]
struct Price {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct StripeClient {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> reqwest::Result<Self> {
        Ok(Self {
            http: http_client(config.timeout)?,
            config,
        })
    }

    fn secret_key(&self) -> Result<&str, StripeError> {
        self.config.secret_key.as_deref().ok_or(StripeError::NotConfigured)
    }

    /// First active price id for `product_id`, if any.
    pub async fn first_active_price(&self, product_id: &str) -> Result<Option<String>, StripeError> {
        let response = self
            .http
            .get(format!("{}/v1/prices", self.config.api_base_url))
            .bearer_auth(self.secret_key()?)
            .query(&[("product", product_id), ("active", "true"), ("limit", "1")])
            .send()
            .await?;

        let prices: PriceList = parse_response(response).await?;
        let price = prices.data.into_iter().next().map(|p| p.id);
        debug!(product_id, price = ?price, "Resolved Stripe price");
        Ok(price)
    }

    /// Create a subscription checkout session for one unit of `price_id`.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        user_id: &str,
        origin: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let success_url = format!("{origin}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}");
        let cancel_url = format!("{origin}/checkout");

        let form = [
            ("mode", "subscription"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url.as_str()),
            ("metadata[userId]", user_id),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.config.api_base_url))
            .bearer_auth(self.secret_key()?)
            .form(&form)
            .send()
            .await?;

        let session: CheckoutSession = parse_response(response).await?;
        info!(user_id, session_id = %session.session_id, "Created checkout session");
        Ok(session)
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StripeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or(body);
    Err(StripeError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_session_shape() {
        let session: CheckoutSession =
            serde_json::from_str(r#"{"id": "cs_test_1", "url": "https://checkout.stripe.com/c/1", "object": "checkout.session"}"#)
                .unwrap();
        assert_eq!(session.session_id, "cs_test_1");

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["sessionId"], "cs_test_1");
        assert_eq!(json["url"], "https://checkout.stripe.com/c/1");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = StripeClient::new(StripeConfig::default()).unwrap();
        assert!(matches!(
            client.first_active_price("prod_1").await,
            Err(StripeError::NotConfigured)
        ));
    }
}
