//! Credential-acquisition strategies.
//!
//! The server selects exactly one strategy at startup. Each strategy either
//! produces a ready token source from stored credential material or reports
//! that interactive authorization is still pending.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use drivebridge_common::{Error, Result};

use crate::gdrive::{AccessTokenSource, AuthManager, ServiceAccountAuth, TokenManager, Tokens};

/// Outcome of a credential acquisition attempt.
pub enum Acquired {
    /// Credential material is available; the relay can serve uploads.
    Ready(Arc<dyn AccessTokenSource>),
    /// No credential yet; the operator must complete the authorization flow.
    Pending,
}

/// A way of obtaining, and for interactive flows persisting, credential
/// material.
#[async_trait]
pub trait CredentialStrategy: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Try to produce a token source from stored credential material.
    async fn acquire(&self) -> Result<Acquired>;

    /// Store tokens obtained from an interactive authorization exchange.
    async fn persist(&self, tokens: &Tokens) -> Result<()>;
}

/// Loads and persists tokens in a local JSON file.
pub struct TokenFileStrategy {
    path: PathBuf,
    auth: Arc<AuthManager>,
}

impl TokenFileStrategy {
    pub fn new(path: impl Into<PathBuf>, auth: Arc<AuthManager>) -> Self {
        Self {
            path: path.into(),
            auth,
        }
    }

    /// Path of the token file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStrategy for TokenFileStrategy {
    fn name(&self) -> &'static str {
        "token-file"
    }

    async fn acquire(&self) -> Result<Acquired> {
        if !self.path.exists() {
            return Ok(Acquired::Pending);
        }

        let raw = tokio::fs::read_to_string(&self.path).await?;
        let tokens: Tokens = serde_json::from_str(&raw).map_err(|e| {
            Error::Serialization(format!("Invalid token file {}: {}", self.path.display(), e))
        })?;

        info!(path = %self.path.display(), "Loaded stored tokens");
        Ok(Acquired::Ready(Arc::new(TokenManager::new(
            self.auth.clone(),
            tokens,
        ))))
    }

    async fn persist(&self, tokens: &Tokens) -> Result<()> {
        let json = serde_json::to_string(tokens)
            .map_err(|e| Error::Serialization(format!("Failed to serialize tokens: {}", e)))?;
        tokio::fs::write(&self.path, json).await?;
        info!(path = %self.path.display(), "Stored tokens");
        Ok(())
    }
}

/// Reads tokens from process configuration; persistence is manual.
pub struct EnvTokenStrategy {
    raw: Option<String>,
    auth: Arc<AuthManager>,
}

impl EnvTokenStrategy {
    pub fn new(raw: Option<String>, auth: Arc<AuthManager>) -> Self {
        Self { raw, auth }
    }
}

#[async_trait]
impl CredentialStrategy for EnvTokenStrategy {
    fn name(&self) -> &'static str {
        "env-token"
    }

    async fn acquire(&self) -> Result<Acquired> {
        let raw = match self.raw.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Acquired::Pending),
        };

        match serde_json::from_str::<Tokens>(raw) {
            Ok(tokens) => Ok(Acquired::Ready(Arc::new(TokenManager::new(
                self.auth.clone(),
                tokens,
            )))),
            Err(e) => {
                // Bad token material must not take the service down
                error!("Ignoring unparseable GOOGLE_TOKENS value: {}", e);
                Ok(Acquired::Pending)
            }
        }
    }

    async fn persist(&self, tokens: &Tokens) -> Result<()> {
        let json = serde_json::to_string(tokens)
            .map_err(|e| Error::Serialization(format!("Failed to serialize tokens: {}", e)))?;
        warn!(
            "No durable token store configured. Set GOOGLE_TOKENS to the following value to keep \
             this credential across restarts: {}",
            json
        );
        Ok(())
    }
}

/// Non-interactive strategy backed by a service-account key file.
pub struct ServiceAccountStrategy {
    key_path: PathBuf,
}

impl ServiceAccountStrategy {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
        }
    }
}

#[async_trait]
impl CredentialStrategy for ServiceAccountStrategy {
    fn name(&self) -> &'static str {
        "service-account"
    }

    async fn acquire(&self) -> Result<Acquired> {
        let auth = ServiceAccountAuth::from_key_file(&self.key_path).await?;
        info!(client_email = %auth.client_email(), "Loaded service account key");
        Ok(Acquired::Ready(Arc::new(auth)))
    }

    async fn persist(&self, _tokens: &Tokens) -> Result<()> {
        Err(Error::InvalidInput(
            "Service account credentials are managed outside the relay".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdrive::AuthConfig;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn test_auth_manager() -> Arc<AuthManager> {
        Arc::new(
            AuthManager::new(AuthConfig {
                client_id: "test_id".to_string(),
                client_secret: "test_secret".to_string(),
                redirect_url: "http://localhost:10000/oauth2callback".to_string(),
                auth_url: None,
                token_url: None,
            })
            .unwrap(),
        )
    }

    fn test_tokens() -> Tokens {
        Tokens {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_token_file_absent_is_pending() {
        let dir = TempDir::new().unwrap();
        let strategy = TokenFileStrategy::new(dir.path().join("token.json"), test_auth_manager());

        assert!(matches!(
            strategy.acquire().await.unwrap(),
            Acquired::Pending
        ));
    }

    #[tokio::test]
    async fn test_token_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let strategy = TokenFileStrategy::new(dir.path().join("token.json"), test_auth_manager());

        strategy.persist(&test_tokens()).await.unwrap();
        assert!(strategy.path().exists());

        match strategy.acquire().await.unwrap() {
            Acquired::Ready(source) => {
                assert_eq!(source.access_token().await.unwrap(), "access");
            }
            Acquired::Pending => panic!("expected stored tokens to be loaded"),
        }
    }

    #[tokio::test]
    async fn test_corrupt_token_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{not valid json").unwrap();

        let strategy = TokenFileStrategy::new(path, test_auth_manager());
        assert!(matches!(
            strategy.acquire().await,
            Err(Error::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_env_tokens_missing_or_empty_is_pending() {
        let strategy = EnvTokenStrategy::new(None, test_auth_manager());
        assert!(matches!(
            strategy.acquire().await.unwrap(),
            Acquired::Pending
        ));

        let strategy = EnvTokenStrategy::new(Some("   ".to_string()), test_auth_manager());
        assert!(matches!(
            strategy.acquire().await.unwrap(),
            Acquired::Pending
        ));
    }

    #[tokio::test]
    async fn test_env_tokens_garbage_is_pending_not_fatal() {
        let strategy =
            EnvTokenStrategy::new(Some("definitely not json".to_string()), test_auth_manager());
        assert!(matches!(
            strategy.acquire().await.unwrap(),
            Acquired::Pending
        ));
    }

    #[tokio::test]
    async fn test_env_tokens_valid_is_ready() {
        let raw = serde_json::to_string(&test_tokens()).unwrap();
        let strategy = EnvTokenStrategy::new(Some(raw), test_auth_manager());

        match strategy.acquire().await.unwrap() {
            Acquired::Ready(source) => {
                assert_eq!(source.access_token().await.unwrap(), "access");
            }
            Acquired::Pending => panic!("expected configured tokens to be loaded"),
        }
    }

    #[tokio::test]
    async fn test_service_account_missing_key_is_config_error() {
        let dir = TempDir::new().unwrap();
        let strategy = ServiceAccountStrategy::new(dir.path().join("missing.json"));

        assert!(matches!(strategy.acquire().await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_service_account_persist_is_rejected() {
        let dir = TempDir::new().unwrap();
        let strategy = ServiceAccountStrategy::new(dir.path().join("key.json"));

        assert!(matches!(
            strategy.persist(&test_tokens()).await,
            Err(Error::InvalidInput(_))
        ));
    }
}
