//! Environment-driven server configuration.

use std::path::PathBuf;

use drivebridge_common::{Error, Result};

/// Default listen port.
const DEFAULT_PORT: u16 = 10000;
/// Default service-account key location.
const DEFAULT_SERVICE_KEY_PATH: &str = "/etc/secrets/service_account.json";
/// Default token file for the token-file strategy.
const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Which credential strategy the relay runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategyKind {
    /// OAuth2 tokens persisted to a local file.
    TokenFile,
    /// OAuth2 tokens held in process configuration.
    EnvToken,
    /// Service-account key file.
    ServiceAccount,
}

impl AuthStrategyKind {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "token-file" => Ok(Self::TokenFile),
            "env-token" => Ok(Self::EnvToken),
            "service-account" => Ok(Self::ServiceAccount),
            other => Err(Error::Config(format!(
                "AUTH_STRATEGY must be one of token-file, env-token, service-account (got `{}`)",
                other
            ))),
        }
    }

    /// Whether this strategy uses the interactive authorization flow.
    pub fn is_interactive(self) -> bool {
        !matches!(self, Self::ServiceAccount)
    }
}

/// Server configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
    /// Selected credential strategy.
    pub strategy: AuthStrategyKind,
    /// Destination folder for every relayed upload.
    pub folder_id: String,
    /// OAuth2 client ID (interactive strategies).
    pub client_id: Option<String>,
    /// OAuth2 client secret (interactive strategies).
    pub client_secret: Option<String>,
    /// OAuth2 redirect URI (interactive strategies).
    pub redirect_uri: Option<String>,
    /// Raw token JSON from GOOGLE_TOKENS (env-token strategy).
    pub google_tokens: Option<String>,
    /// Token file path (token-file strategy).
    pub token_path: PathBuf,
    /// Service-account key path (service-account strategy).
    pub service_key_path: PathBuf,
    /// Spool directory for received uploads.
    pub upload_dir: PathBuf,
    /// Authorization endpoint override (defaults to Google's).
    pub auth_url: Option<String>,
    /// Token endpoint override (defaults to Google's).
    pub token_url: Option<String>,
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    /// - `DRIVE_FOLDER_ID` unset
    /// - OAuth2 client values unset for an interactive strategy
    /// - Unrecognized `AUTH_STRATEGY` or unparseable `PORT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let strategy = match get("AUTH_STRATEGY") {
            Some(value) => AuthStrategyKind::parse(value.trim())?,
            None => AuthStrategyKind::TokenFile,
        };

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                Error::Config(format!("PORT must be a port number (got `{}`)", raw))
            })?,
            None => DEFAULT_PORT,
        };

        let folder_id = get("DRIVE_FOLDER_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config("DRIVE_FOLDER_ID is not set".to_string()))?;

        let client_id = get("GOOGLE_CLIENT_ID").filter(|v| !v.is_empty());
        let client_secret = get("GOOGLE_CLIENT_SECRET").filter(|v| !v.is_empty());
        let redirect_uri = get("REDIRECT_URI").filter(|v| !v.is_empty());

        if strategy.is_interactive() {
            for (name, value) in [
                ("GOOGLE_CLIENT_ID", &client_id),
                ("GOOGLE_CLIENT_SECRET", &client_secret),
                ("REDIRECT_URI", &redirect_uri),
            ] {
                if value.is_none() {
                    return Err(Error::Config(format!("{} is not set", name)));
                }
            }
        }

        let token_path = get("TOKEN_PATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH));

        let service_key_path = get("GCP_SERVICE_KEY_PATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVICE_KEY_PATH));

        let upload_dir = get("UPLOAD_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("uploads"));

        Ok(Self {
            port,
            strategy,
            folder_id,
            client_id,
            client_secret,
            redirect_uri,
            google_tokens: get("GOOGLE_TOKENS"),
            token_path,
            service_key_path,
            upload_dir,
            auth_url: None,
            token_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_for_interactive_setup() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("DRIVE_FOLDER_ID", "folder-123"),
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("REDIRECT_URI", "http://localhost:10000/oauth2callback"),
        ]))
        .unwrap();

        assert_eq!(config.strategy, AuthStrategyKind::TokenFile);
        assert_eq!(config.port, 10000);
        assert_eq!(config.folder_id, "folder-123");
        assert_eq!(config.token_path, PathBuf::from("token.json"));
        assert_eq!(
            config.service_key_path,
            PathBuf::from("/etc/secrets/service_account.json")
        );
    }

    #[test]
    fn test_missing_folder_id_is_fatal_for_service_accounts() {
        let result = ServerConfig::from_lookup(lookup(&[("AUTH_STRATEGY", "service-account")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_folder_id_is_fatal_for_interactive_strategies() {
        let result = ServerConfig::from_lookup(lookup(&[
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("REDIRECT_URI", "http://localhost:10000/oauth2callback"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_service_account_does_not_need_oauth_client() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("AUTH_STRATEGY", "service-account"),
            ("DRIVE_FOLDER_ID", "folder-123"),
            ("GCP_SERVICE_KEY_PATH", "/secrets/key.json"),
        ]))
        .unwrap();

        assert_eq!(config.strategy, AuthStrategyKind::ServiceAccount);
        assert!(!config.strategy.is_interactive());
        assert_eq!(config.service_key_path, PathBuf::from("/secrets/key.json"));
    }

    #[test]
    fn test_interactive_strategy_requires_oauth_client() {
        let result = ServerConfig::from_lookup(lookup(&[
            ("AUTH_STRATEGY", "env-token"),
            ("DRIVE_FOLDER_ID", "folder-123"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let result = ServerConfig::from_lookup(lookup(&[
            ("AUTH_STRATEGY", "keyring"),
            ("DRIVE_FOLDER_ID", "folder-123"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_port_parsing() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("AUTH_STRATEGY", "service-account"),
            ("DRIVE_FOLDER_ID", "folder-123"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);

        let result = ServerConfig::from_lookup(lookup(&[
            ("AUTH_STRATEGY", "service-account"),
            ("DRIVE_FOLDER_ID", "folder-123"),
            ("PORT", "not-a-port"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
