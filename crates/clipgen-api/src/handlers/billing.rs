//! Stripe checkout.

use axum::extract::State;
use axum::http::header::ORIGIN;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::non_blank;
use crate::metrics;
use crate::security::normalize_origin;
use crate::services::CheckoutSession;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Start a subscription checkout for the first active price of a product.
/// Redirects go back to the request origin, else the configured app URL.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> ApiResult<Json<CheckoutSession>> {
    let product_id = non_blank(req.product_id.as_deref())
        .ok_or_else(|| ApiError::bad_request("productId is required"))?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .and_then(normalize_origin)
        .unwrap_or_else(|| state.config.app_url.clone());

    let price_id = match state.stripe.first_active_price(product_id).await {
        Ok(Some(price)) => price,
        Ok(None) => {
            metrics::record_checkout_session("no_price");
            return Err(ApiError::bad_request("No active price found for product"));
        }
        Err(e) => {
            metrics::record_checkout_session("error");
            warn!(product_id, "Price lookup failed: {}", e);
            return Err(e.into());
        }
    };

    let session = state
        .stripe
        .create_checkout_session(&price_id, &user.user_id, &origin)
        .await
        .inspect_err(|_| metrics::record_checkout_session("error"))?;

    metrics::record_checkout_session("created");
    Ok(Json(session))
}
