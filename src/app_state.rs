use std::sync::Arc;
use tracing::warn;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{
        identity::{IdentityVerifier, JwtIdentityVerifier},
        webhook::WebhookVerifier,
        TankaDatabase, TankaStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub store: TankaStore,
    pub identity: Arc<dyn IdentityVerifier>,
    /// `None` when no webhook secret is configured
    pub webhook: Option<Arc<WebhookVerifier>>,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Initialize database
        let database =
            TankaDatabase::connect(&config.database.url, config.database.max_connections).await?;
        database.init().await?;

        let identity = JwtIdentityVerifier::from_config(&config.auth)?;

        let webhook = match &config.webhook.signing_secret {
            Some(secret) => Some(Arc::new(WebhookVerifier::new(secret)?)),
            None => {
                warn!("CLERK_WEBHOOK_SECRET is not set, identity webhooks will be rejected");
                None
            }
        };

        Ok(Self::from_parts(
            TankaStore::new(Arc::new(database)),
            Arc::new(identity),
            webhook,
        ))
    }

    pub fn from_parts(
        store: TankaStore,
        identity: Arc<dyn IdentityVerifier>,
        webhook: Option<Arc<WebhookVerifier>>,
    ) -> Self {
        Self {
            store,
            identity,
            webhook,
        }
    }

    pub fn webhook_verifier(&self) -> AppResult<&WebhookVerifier> {
        self.webhook.as_deref().ok_or_else(|| {
            crate::error::AppError::ConfigurationError("Webhook secret is not configured".to_string())
        })
    }
}
