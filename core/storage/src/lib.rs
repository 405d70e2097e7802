//! Google Drive access layer for DriveBridge.
//!
//! This crate owns everything between the HTTP surface and the provider:
//! OAuth2 and service-account token management, the Drive REST client, the
//! retry policy for transient upstream failures, and the credential
//! strategies the server selects between at startup.
//!
//! # Design Principles
//! - One client, many credentials: the Drive client only sees an
//!   [`gdrive::AccessTokenSource`], never a concrete credential type
//! - Async operations: all I/O is async
//! - Unified error semantics: provider responses map onto the shared
//!   error taxonomy, with transient failures distinct from permanent ones

pub mod credentials;
pub mod gdrive;
pub mod retry;

pub use credentials::{
    Acquired, CredentialStrategy, EnvTokenStrategy, ServiceAccountStrategy, TokenFileStrategy,
};
pub use gdrive::{
    AccessTokenSource, AuthConfig, AuthManager, DriveClient, DriveClientConfig, DriveFile,
    ServiceAccountAuth, TokenManager, Tokens,
};
pub use retry::{RetryConfig, RetryExecutor};
