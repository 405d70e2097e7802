//! Google Drive API integration.

pub mod auth;
pub mod client;
pub mod service_account;

use async_trait::async_trait;

use drivebridge_common::Result;

pub use auth::{AuthConfig, AuthManager, TokenManager, Tokens};
pub use client::{DriveClient, DriveClientConfig, DriveFile};
pub use service_account::{ServiceAccountAuth, ServiceAccountKey};

/// Google Drive scope restricted to files the application creates.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Source of bearer tokens for Drive API calls.
///
/// Implemented by [`TokenManager`] (user OAuth2 tokens) and
/// [`ServiceAccountAuth`] (JWT-bearer grants), so the client does not care
/// which credential strategy produced it.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Return a valid (non-expired) access token.
    async fn access_token(&self) -> Result<String>;
}
