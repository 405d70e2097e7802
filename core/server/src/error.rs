//! HTTP error mapping for the relay.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use drivebridge_common::Error as CoreError;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload attempted before any credential was established.
    #[error("Not authorized yet")]
    NotAuthorized,

    /// Multipart request carried no `file` field.
    #[error("No file uploaded")]
    NoFile,

    /// Callback hit without an authorization code.
    #[error("Missing authorization code")]
    MissingCode,

    /// Malformed multipart payload.
    #[error("Invalid multipart request: {0}")]
    BadMultipart(String),

    /// Authorization-code exchange or token persistence failed.
    #[error("Authentication with Google failed: {0}")]
    Exchange(#[source] CoreError),

    /// Spooling the received file to disk failed.
    #[error("Failed to spool upload: {0}")]
    Spool(#[source] std::io::Error),

    /// The provider call failed.
    #[error("Error uploading to Drive: {0}")]
    Upload(#[source] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {:?}", self);

        match self {
            Self::NotAuthorized => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Not authorized yet. Visit / to connect Google Drive first."
                })),
            )
                .into_response(),
            Self::NoFile => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "No file uploaded" })),
            )
                .into_response(),
            Self::BadMultipart(reason) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid multipart request", "details": reason })),
            )
                .into_response(),
            Self::MissingCode => {
                (StatusCode::BAD_REQUEST, Html("Missing authorization code.")).into_response()
            }
            Self::Exchange(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("Error authenticating with Google."),
            )
                .into_response(),
            Self::Spool(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Error uploading to Drive",
                    "details": e.to_string()
                })),
            )
                .into_response(),
            Self::Upload(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Error uploading to Drive",
                    "details": e.to_string()
                })),
            )
                .into_response(),
        }
    }
}
