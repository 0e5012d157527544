//! Secret resolution from the environment or SSM Parameter Store.
//!
//! A secret `NAME` is read from SSM when `NAME_PARAM` holds a parameter
//! name, otherwise from the `NAME` variable itself. SSM values are cached
//! for the life of the process.

use std::collections::HashMap;

use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::Client;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("Parameter {0} is configured but no SSM client is available")]
    NoClient(String),

    #[error("Failed to read parameter {name}: {message}")]
    Fetch { name: String, message: String },

    #[error("Parameter {0} has no value")]
    Empty(String),
}

pub struct SecretsResolver {
    ssm: Option<Client>,
    cache: RwLock<HashMap<String, String>>,
}

impl SecretsResolver {
    pub fn new(ssm: Option<Client>) -> Self {
        Self {
            ssm,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Environment-only resolver.
    pub fn env_only() -> Self {
        Self::new(None)
    }

    /// Resolve `name`. `Ok(None)` when it is set nowhere.
    pub async fn resolve(&self, name: &str) -> Result<Option<String>, SecretsError> {
        let param_var = format!("{name}_PARAM");
        if let Some(parameter) = std::env::var(&param_var).ok().filter(|p| !p.is_empty()) {
            return self.get_parameter(&parameter).await.map(Some);
        }

        Ok(std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    /// Fetch a decrypted parameter, consulting the cache first.
    pub async fn get_parameter(&self, parameter: &str) -> Result<String, SecretsError> {
        if let Some(value) = self.cache.read().await.get(parameter) {
            return Ok(value.clone());
        }

        let client = self
            .ssm
            .as_ref()
            .ok_or_else(|| SecretsError::NoClient(parameter.to_string()))?;

        debug!(parameter, "Fetching SSM parameter");
        let output = client
            .get_parameter()
            .name(parameter)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| SecretsError::Fetch {
                name: parameter.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let value = output
            .parameter()
            .and_then(|p| p.value())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SecretsError::Empty(parameter.to_string()))?
            .to_string();

        self.cache
            .write()
            .await
            .insert(parameter.to_string(), value.clone());
        info!(parameter, "Loaded secret from SSM");
        Ok(value)
    }

    #[cfg(test)]
    async fn seed(&self, parameter: &str, value: &str) {
        self.cache
            .write()
            .await
            .insert(parameter.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_from_env() {
        std::env::set_var("CLIPGEN_TEST_SECRET_A", "from-env");
        let resolver = SecretsResolver::env_only();
        assert_eq!(
            resolver.resolve("CLIPGEN_TEST_SECRET_A").await.unwrap().as_deref(),
            Some("from-env")
        );
        assert_eq!(resolver.resolve("CLIPGEN_TEST_SECRET_UNSET").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_param_requires_client_unless_cached() {
        std::env::set_var("CLIPGEN_TEST_SECRET_B_PARAM", "/clipgen/test/b");
        let resolver = SecretsResolver::env_only();
        assert!(matches!(
            resolver.resolve("CLIPGEN_TEST_SECRET_B").await,
            Err(SecretsError::NoClient(_))
        ));

        resolver.seed("/clipgen/test/b", "cached").await;
        assert_eq!(
            resolver.resolve("CLIPGEN_TEST_SECRET_B").await.unwrap().as_deref(),
            Some("cached")
        );
    }
}
