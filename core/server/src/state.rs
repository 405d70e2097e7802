//! Shared application state.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use drivebridge_common::{Error, Result};
use drivebridge_storage::credentials::{
    Acquired, CredentialStrategy, EnvTokenStrategy, ServiceAccountStrategy, TokenFileStrategy,
};
use drivebridge_storage::gdrive::{
    AccessTokenSource, AuthConfig, AuthManager, DriveClient, DriveClientConfig,
};

use crate::config::{AuthStrategyKind, ServerConfig};

/// Process-wide state handed to every request handler.
///
/// The Drive client is the single shared, lazily-initialized handle: written
/// by startup acquisition and the OAuth2 callback, read by the upload and
/// status handlers.
pub struct AppState {
    config: ServerConfig,
    auth: Option<Arc<AuthManager>>,
    strategy: Arc<dyn CredentialStrategy>,
    drive: RwLock<Option<Arc<DriveClient>>>,
    client_config: DriveClientConfig,
}

impl AppState {
    /// Build state from configuration. Does not touch the network.
    pub fn new(config: ServerConfig) -> Result<Self> {
        Self::with_client_config(config, DriveClientConfig::default())
    }

    /// Build state with explicit Drive client tunables.
    pub fn with_client_config(
        config: ServerConfig,
        client_config: DriveClientConfig,
    ) -> Result<Self> {
        let auth = if config.strategy.is_interactive() {
            let auth_config = AuthConfig {
                client_id: required(&config.client_id, "GOOGLE_CLIENT_ID")?,
                client_secret: required(&config.client_secret, "GOOGLE_CLIENT_SECRET")?,
                redirect_url: required(&config.redirect_uri, "REDIRECT_URI")?,
                auth_url: config.auth_url.clone(),
                token_url: config.token_url.clone(),
            };
            Some(Arc::new(AuthManager::new(auth_config)?))
        } else {
            None
        };

        let strategy: Arc<dyn CredentialStrategy> = match (config.strategy, &auth) {
            (AuthStrategyKind::TokenFile, Some(auth)) => Arc::new(TokenFileStrategy::new(
                config.token_path.clone(),
                auth.clone(),
            )),
            (AuthStrategyKind::EnvToken, Some(auth)) => Arc::new(EnvTokenStrategy::new(
                config.google_tokens.clone(),
                auth.clone(),
            )),
            (AuthStrategyKind::ServiceAccount, _) => Arc::new(ServiceAccountStrategy::new(
                config.service_key_path.clone(),
            )),
            _ => {
                return Err(Error::Config(
                    "Interactive strategy without an OAuth2 client".to_string(),
                ))
            }
        };

        Ok(Self {
            config,
            auth,
            strategy,
            drive: RwLock::new(None),
            client_config,
        })
    }

    /// Run the configured strategy's startup acquisition.
    pub async fn connect(&self) -> Result<()> {
        match self.strategy.acquire().await? {
            Acquired::Ready(source) => {
                self.install(source).await;
                info!(strategy = self.strategy.name(), "Drive client ready");
            }
            Acquired::Pending => {
                info!(
                    strategy = self.strategy.name(),
                    "No stored credentials; visit / to authorize"
                );
            }
        }
        Ok(())
    }

    /// Wrap a token source in a Drive client and publish it.
    pub async fn install(&self, source: Arc<dyn AccessTokenSource>) {
        let client = DriveClient::with_config(source, self.client_config.clone());
        *self.drive.write().await = Some(Arc::new(client));
    }

    /// The current Drive client, if a credential has been established.
    pub async fn drive(&self) -> Option<Arc<DriveClient>> {
        self.drive.read().await.clone()
    }

    /// The OAuth2 manager; `None` for non-interactive strategies.
    pub fn auth(&self) -> Option<&Arc<AuthManager>> {
        self.auth.as_ref()
    }

    /// Whether this deployment uses the interactive authorization flow.
    pub fn interactive(&self) -> bool {
        self.auth.is_some()
    }

    /// The configured credential strategy.
    pub fn strategy(&self) -> &Arc<dyn CredentialStrategy> {
        &self.strategy
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| Error::Config(format!("{} is not set", name)))
}
