//! HTTP surface of the DriveBridge upload relay.
//!
//! Three routes: a status/authorization page, the OAuth2 callback (only when
//! an interactive credential strategy is configured), and the upload
//! endpoint that relays multipart file uploads into the configured Drive
//! folder.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{AuthStrategyKind, ServerConfig};
pub use routes::create_router;
pub use state::AppState;
