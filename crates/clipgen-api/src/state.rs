//! Application state.

use std::sync::Arc;

use anyhow::Context;
use aws_config::BehaviorVersion;
use tracing::{info, warn};

use clipgen_events::{EventBridgePublisher, EventPublisher, EventsConfig, RecordingPublisher};
use clipgen_storage::{StorageConfig, UploadClient};
use clipgen_store::{
    DynamoJobRepository, DynamoPresetRepository, DynamoUserRepository, InMemoryJobRepository,
    InMemoryPresetRepository, InMemoryUserRepository, JobRepository, PresetRepository,
    StoreConfig, UserRepository,
};

use crate::auth::{AuthConfig, GoogleJwksVerifier, IdTokenVerifier, SessionKeys};
use crate::config::{ApiConfig, Backend};
use crate::services::{
    SecretsResolver, StripeClient, StripeConfig, YoutubeClient, YoutubeConfig,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jobs: Arc<dyn JobRepository>,
    pub presets: Arc<dyn PresetRepository>,
    pub users: Arc<dyn UserRepository>,
    pub events: Arc<dyn EventPublisher>,
    pub uploads: Arc<UploadClient>,
    pub youtube: Arc<YoutubeClient>,
    pub stripe: Arc<StripeClient>,
    pub id_tokens: Arc<dyn IdTokenVerifier>,
    pub sessions: Arc<SessionKeys>,
}

/// Clients whose credentials come through the secrets resolver.
struct Integrations {
    youtube: YoutubeClient,
    stripe: StripeClient,
    id_tokens: GoogleJwksVerifier,
    sessions: SessionKeys,
}

impl Integrations {
    async fn load(config: &ApiConfig, secrets: &SecretsResolver) -> anyhow::Result<Self> {
        let youtube_key = secrets.resolve("YOUTUBE_API_KEY").await?;
        if youtube_key.is_none() {
            warn!("YOUTUBE_API_KEY not set, metadata lookups will scrape watch pages");
        }
        let stripe_key = secrets.resolve("STRIPE_SECRET_KEY").await?;
        if stripe_key.is_none() {
            warn!("STRIPE_SECRET_KEY not set, checkout is unavailable");
        }
        let session_secret = secrets.resolve("SESSION_SECRET").await?;

        let auth = AuthConfig::from_env(session_secret, config.is_production())?;
        Ok(Self {
            youtube: YoutubeClient::new(YoutubeConfig::from_env(youtube_key))
                .context("building YouTube client")?,
            stripe: StripeClient::new(StripeConfig::from_env(stripe_key))
                .context("building Stripe client")?,
            id_tokens: GoogleJwksVerifier::new(&auth).context("building JWKS client")?,
            sessions: SessionKeys::from_config(&auth),
        })
    }
}

impl AppState {
    /// Build state for the configured backend.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        match config.backend {
            Backend::Aws => Self::aws(config).await,
            Backend::Memory => Self::memory(config).await,
        }
    }

    /// DynamoDB, EventBridge, S3 and SSM from the default AWS credential chain.
    pub async fn aws(config: ApiConfig) -> anyhow::Result<Self> {
        let aws = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let secrets = SecretsResolver::new(Some(aws_sdk_ssm::Client::new(&aws)));
        let integrations = Integrations::load(&config, &secrets).await?;

        let store_config = StoreConfig::from_env();
        let dynamo = aws_sdk_dynamodb::Client::new(&aws);
        let events = EventBridgePublisher::new(
            aws_sdk_eventbridge::Client::new(&aws),
            EventsConfig::from_env(),
        );
        let storage_config = StorageConfig::from_env().context("loading storage config")?;
        let uploads = UploadClient::new(aws_sdk_s3::Client::new(&aws), storage_config);

        info!(
            jobs_table = %store_config.jobs_table,
            "Using AWS backends"
        );

        Ok(Self {
            jobs: Arc::new(DynamoJobRepository::new(dynamo.clone(), &store_config)),
            presets: Arc::new(DynamoPresetRepository::new(dynamo.clone(), &store_config)),
            users: Arc::new(DynamoUserRepository::new(dynamo, &store_config)),
            events: Arc::new(events),
            uploads: Arc::new(uploads),
            youtube: Arc::new(integrations.youtube),
            stripe: Arc::new(integrations.stripe),
            id_tokens: Arc::new(integrations.id_tokens),
            sessions: Arc::new(integrations.sessions),
            config,
        })
    }

    /// In-process repositories and a recording publisher. Uploads are
    /// signed offline with placeholder credentials.
    pub async fn memory(config: ApiConfig) -> anyhow::Result<Self> {
        let secrets = SecretsResolver::env_only();
        let integrations = Integrations::load(&config, &secrets).await?;

        let storage_config = StorageConfig::from_env()
            .unwrap_or_else(|_| StorageConfig::local("http://localhost:4566/clipgen-local"));
        let uploads = UploadClient::with_static_credentials(storage_config, "local", "local");

        info!("Using in-memory backends");

        Ok(Self {
            jobs: Arc::new(InMemoryJobRepository::new()),
            presets: Arc::new(InMemoryPresetRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            events: Arc::new(RecordingPublisher::new()),
            uploads: Arc::new(uploads),
            youtube: Arc::new(integrations.youtube),
            stripe: Arc::new(integrations.stripe),
            id_tokens: Arc::new(integrations.id_tokens),
            sessions: Arc::new(integrations.sessions),
            config,
        })
    }
}
