//! OAuth2 authentication and token management for Google Drive.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, Scope, TokenResponse,
    TokenUrl,
};
use serde::{Deserialize, Serialize};

use drivebridge_common::{Error, Result};

use super::{AccessTokenSource, DRIVE_SCOPE};

/// OAuth2 authorization endpoint.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// OAuth2 token endpoint.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth2 tokens with expiration tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    /// Access token for API requests.
    pub access_token: String,
    /// Refresh token for obtaining new access tokens.
    pub refresh_token: String,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Check if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        // Consider expired if less than 5 minutes remaining
        self.expires_at < Utc::now() + Duration::minutes(5)
    }
}

/// Configuration for OAuth2 authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Redirect URL the provider sends the authorization code to.
    pub redirect_url: String,
    /// Authorization endpoint override (defaults to Google's).
    #[serde(default)]
    pub auth_url: Option<String>,
    /// Token endpoint override (defaults to Google's).
    #[serde(default)]
    pub token_url: Option<String>,
}

/// OAuth2 authentication manager for Google Drive.
pub struct AuthManager {
    client: BasicClient,
    config: AuthConfig,
}

impl AuthManager {
    /// Create a new authentication manager.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let auth_url = config
            .auth_url
            .clone()
            .unwrap_or_else(|| GOOGLE_AUTH_URL.to_string());
        let token_url = config
            .token_url
            .clone()
            .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string());

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(auth_url)
                .map_err(|e| Error::InvalidInput(format!("Invalid auth URL: {}", e)))?,
            Some(
                TokenUrl::new(token_url)
                    .map_err(|e| Error::InvalidInput(format!("Invalid token URL: {}", e)))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_url.clone())
                .map_err(|e| Error::InvalidInput(format!("Invalid redirect URL: {}", e)))?,
        );

        Ok(Self { client, config })
    }

    /// Generate the authorization URL for the user to visit.
    ///
    /// Returns the URL and a CSRF token.
    pub fn authorization_url(&self) -> (String, String) {
        let (auth_url, csrf_token) = self
            .client
            .authorize_url(oauth2::CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        (auth_url.to_string(), csrf_token.secret().clone())
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Preconditions
    /// - `code` is a valid authorization code from the OAuth2 callback
    ///
    /// # Errors
    /// - Invalid authorization code
    /// - Network errors
    pub async fn exchange_code(&self, code: &str) -> Result<Tokens> {
        use oauth2::reqwest::async_http_client;
        use oauth2::AuthorizationCode;

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| Error::Authentication(format!("Token exchange failed: {}", e)))?;

        let access_token = token_result.access_token().secret().clone();
        let refresh_token = token_result
            .refresh_token()
            .ok_or_else(|| {
                Error::Authentication(
                    "No refresh token received. Ensure 'offline' access and 'consent' prompt were requested.".to_string(),
                )
            })?
            .secret()
            .clone();

        let expires_in = token_result
            .expires_in()
            .unwrap_or_else(|| std::time::Duration::from_secs(3600));

        let expires_at =
            Utc::now() + Duration::from_std(expires_in).unwrap_or_else(|_| Duration::hours(1));

        Ok(Tokens {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Refresh an access token using the refresh token.
    ///
    /// # Errors
    /// - Invalid or revoked refresh token
    /// - Network errors
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Tokens> {
        use oauth2::reqwest::async_http_client;
        use oauth2::RefreshToken;

        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| Error::Authentication(format!("Token refresh failed: {}", e)))?;

        let access_token = token_result.access_token().secret().clone();

        // Refresh tokens may or may not be returned in refresh response
        let new_refresh_token = token_result
            .refresh_token()
            .map(|t| t.secret().clone())
            .unwrap_or_else(|| refresh_token.to_string());

        let expires_in = token_result
            .expires_in()
            .unwrap_or_else(|| std::time::Duration::from_secs(3600));

        let expires_at =
            Utc::now() + Duration::from_std(expires_in).unwrap_or_else(|_| Duration::hours(1));

        Ok(Tokens {
            access_token,
            refresh_token: new_refresh_token,
            expires_at,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

/// Token manager that automatically refreshes expired tokens.
pub struct TokenManager {
    auth_manager: Arc<AuthManager>,
    tokens: tokio::sync::RwLock<Tokens>,
}

impl TokenManager {
    /// Create a new token manager with initial tokens.
    pub fn new(auth_manager: Arc<AuthManager>, tokens: Tokens) -> Self {
        Self {
            auth_manager,
            tokens: tokio::sync::RwLock::new(tokens),
        }
    }

    /// Get a valid access token, refreshing if necessary.
    ///
    /// # Errors
    /// - Token refresh failed
    pub async fn get_access_token(&self) -> Result<String> {
        let tokens = self.tokens.read().await;

        if !tokens.is_expired() {
            return Ok(tokens.access_token.clone());
        }

        drop(tokens);

        // Need to refresh
        let mut tokens = self.tokens.write().await;

        // Double-check after acquiring write lock
        if !tokens.is_expired() {
            return Ok(tokens.access_token.clone());
        }

        tracing::info!("Refreshing expired access token");

        let new_tokens = self
            .auth_manager
            .refresh_token(&tokens.refresh_token)
            .await?;

        *tokens = new_tokens;

        Ok(tokens.access_token.clone())
    }

    /// Get the current tokens.
    pub async fn get_tokens(&self) -> Tokens {
        self.tokens.read().await.clone()
    }
}

#[async_trait]
impl AccessTokenSource for TokenManager {
    async fn access_token(&self) -> Result<String> {
        self.get_access_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            client_id: "test_id".to_string(),
            client_secret: "test_secret".to_string(),
            redirect_url: "http://localhost:10000/oauth2callback".to_string(),
            auth_url: None,
            token_url: None,
        }
    }

    #[test]
    fn test_tokens_expiration() {
        let tokens = Tokens {
            access_token: "test".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() - Duration::hours(1),
        };

        assert!(tokens.is_expired());

        let valid_tokens = Tokens {
            access_token: "test".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        };

        assert!(!valid_tokens.is_expired());
    }

    #[test]
    fn test_tokens_near_expiration() {
        // Token expiring in 4 minutes should be considered expired (5 min buffer)
        let tokens = Tokens {
            access_token: "test".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::minutes(4),
        };

        assert!(tokens.is_expired());
    }

    #[test]
    fn test_tokens_serialization() {
        let tokens = Tokens {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now(),
        };

        let json = serde_json::to_string(&tokens).unwrap();
        let deserialized: Tokens = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.access_token, tokens.access_token);
        assert_eq!(deserialized.refresh_token, tokens.refresh_token);
    }

    #[test]
    fn test_auth_manager_creation() {
        let manager = AuthManager::new(test_config()).unwrap();
        assert_eq!(manager.config().client_id, "test_id");
    }

    #[test]
    fn test_authorization_url_generation() {
        let manager = AuthManager::new(test_config()).unwrap();
        let (url, csrf_token) = manager.authorization_url();

        assert!(url.contains("accounts.google.com"));
        assert!(url.contains("client_id=test_id"));
        assert!(url.contains("scope="));
        assert!(url.contains("access_type=offline"));
        assert!(!csrf_token.is_empty());
    }

    #[tokio::test]
    async fn test_exchange_code_against_mock_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"at","refresh_token":"rt","token_type":"Bearer","expires_in":3600}"#,
            )
            .create_async()
            .await;

        let mut config = test_config();
        config.token_url = Some(format!("{}/token", server.url()));
        let manager = AuthManager::new(config).unwrap();

        let tokens = manager.exchange_code("the-code").await.unwrap();
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.refresh_token, "rt");
        assert!(!tokens.is_expired());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_code_failure_is_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let mut config = test_config();
        config.token_url = Some(format!("{}/token", server.url()));
        let manager = AuthManager::new(config).unwrap();

        let result = manager.exchange_code("bad-code").await;
        assert!(matches!(result, Err(Error::Authentication(_))));
    }
}
