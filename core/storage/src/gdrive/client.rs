//! Google Drive API client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};

use drivebridge_common::{Error, Result};

use crate::retry::{RetryConfig, RetryExecutor};

use super::AccessTokenSource;

/// Google Drive upload API base URL.
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Per-request timeout for provider calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Boundary for `multipart/related` upload bodies.
const UPLOAD_BOUNDARY: &str = "DriveBridgeBoundary";

/// Google Drive file metadata echoed by the create call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveFile {
    /// File ID.
    pub id: String,
    /// File name.
    pub name: String,
}

/// Tunables for the Drive client.
#[derive(Debug, Clone)]
pub struct DriveClientConfig {
    /// Upload API base URL.
    pub upload_base: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryConfig,
}

impl Default for DriveClientConfig {
    fn default() -> Self {
        Self {
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

/// Google Drive API client.
pub struct DriveClient {
    http: Client,
    tokens: Arc<dyn AccessTokenSource>,
    config: DriveClientConfig,
}

impl DriveClient {
    /// Create a new Drive client with default configuration.
    pub fn new(tokens: Arc<dyn AccessTokenSource>) -> Self {
        Self::with_config(tokens, DriveClientConfig::default())
    }

    /// Create a new Drive client with explicit tunables.
    pub fn with_config(tokens: Arc<dyn AccessTokenSource>, config: DriveClientConfig) -> Self {
        let http = Client::builder()
            .user_agent("DriveBridge/0.1")
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            tokens,
            config,
        }
    }

    /// Get authorization header.
    async fn auth_header(&self) -> Result<String> {
        let token = self.tokens.access_token().await?;
        Ok(format!("Bearer {}", token))
    }

    /// Create a file in the given folder, returning the provider's `id` and
    /// `name` echo.
    ///
    /// Transient failures (transport errors, 429, 5xx) are retried per the
    /// configured policy; credential and other permanent failures surface
    /// immediately.
    pub async fn create_file(
        &self,
        name: &str,
        parent_id: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<DriveFile> {
        let executor = RetryExecutor::new(self.config.retry.clone());
        executor
            .execute(|| {
                let data = data.clone();
                async move { self.create_file_once(name, parent_id, mime_type, data).await }
            })
            .await
    }

    async fn create_file_once(
        &self,
        name: &str,
        parent_id: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<DriveFile> {
        let url = format!("{}/files?uploadType=multipart", self.config.upload_base);
        let auth = self.auth_header().await?;

        let metadata = serde_json::json!({
            "name": name,
            "parents": [parent_id]
        });

        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| Error::Serialization(format!("Failed to serialize metadata: {}", e)))?;

        // Build multipart/related request
        let mut body = Vec::with_capacity(data.len() + 512);

        // Metadata part
        body.extend_from_slice(format!("--{}\r\n", UPLOAD_BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(metadata_json.as_bytes());
        body.extend_from_slice(b"\r\n");

        // Media part
        body.extend_from_slice(format!("--{}\r\n", UPLOAD_BOUNDARY).as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
        body.extend_from_slice(&data);
        body.extend_from_slice(b"\r\n");

        // End boundary
        body.extend_from_slice(format!("--{}--", UPLOAD_BOUNDARY).as_bytes());

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, auth)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", UPLOAD_BOUNDARY),
            )
            .query(&[("fields", "id,name")])
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to upload file: {}", e)))?;

        self.handle_response(response).await
    }

    /// Handle API response with error checking.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Network(format!("Failed to parse response: {}", e)))
        } else if status == StatusCode::UNAUTHORIZED {
            Err(Error::Authentication(
                "Invalid or expired token".to_string(),
            ))
        } else if status == StatusCode::FORBIDDEN {
            Err(Error::PermissionDenied("Access denied".to_string()))
        } else if status == StatusCode::NOT_FOUND {
            Err(Error::NotFound("Resource not found".to_string()))
        } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Network(format!("API error: {} - {}", status, body)))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Storage(format!("API error: {} - {}", status, body)))
        }
    }
}
