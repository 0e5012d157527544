//! Third-party service clients.

pub mod secrets;
pub mod stripe;
pub mod youtube;

use std::time::Duration;

pub use secrets::{SecretsError, SecretsResolver};
pub use stripe::{CheckoutSession, StripeClient, StripeConfig, StripeError};
pub use youtube::{YoutubeClient, YoutubeConfig};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound HTTP client with connect and request timeouts.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .user_agent(concat!("clipgen-api/", env!("CARGO_PKG_VERSION")))
        .build()
}
