//! Request handlers and router for the relay.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use drivebridge_common::Error;
use drivebridge_storage::gdrive::TokenManager;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the relay router.
///
/// The OAuth2 callback route only exists for the interactive credential
/// strategies.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(status))
        .route("/upload", post(upload));

    if state.interactive() {
        router = router.route("/oauth2callback", get(oauth_callback));
    }

    router
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status(State(state): State<Arc<AppState>>) -> Html<String> {
    if state.drive().await.is_some() {
        return Html(
            "Application connected to Google Drive and ready to upload files.".to_string(),
        );
    }

    match state.auth() {
        Some(auth) => {
            let (auth_url, _csrf) = auth.authorization_url();
            Html(format!(
                "<h3>Authorize the application to connect with Google Drive:</h3>\n\
                 <a href=\"{}\">Connect with Google</a>",
                auth_url
            ))
        }
        None => Html("Drive credentials are not available yet.".to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Html<&'static str>, ApiError> {
    let code = query
        .code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or(ApiError::MissingCode)?;

    let Some(auth) = state.auth() else {
        return Err(ApiError::Exchange(Error::Config(
            "OAuth2 client is not configured".to_string(),
        )));
    };

    let tokens = auth
        .exchange_code(code)
        .await
        .map_err(ApiError::Exchange)?;

    state
        .strategy()
        .persist(&tokens)
        .await
        .map_err(ApiError::Exchange)?;

    let source = Arc::new(TokenManager::new(auth.clone(), tokens));
    state.install(source).await;
    info!("Authorization complete; Drive client installed");

    Ok(Html("Authentication complete. You can close this tab."))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    file_id: String,
    file_name: String,
}

async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let Some(drive) = state.drive().await else {
        return Err(ApiError::NotAuthorized);
    };

    let Some(received) = spool_file(&state, multipart).await? else {
        return Err(ApiError::NoFile);
    };

    let data = tokio::fs::read(received.path())
        .await
        .map_err(ApiError::Spool)?;

    let file = drive
        .create_file(
            &received.file_name,
            &state.config().folder_id,
            &received.mime_type,
            data,
        )
        .await
        .map_err(ApiError::Upload)?;

    info!(file_id = %file.id, file_name = %file.name, "Upload relayed");

    Ok(Json(UploadResponse {
        success: true,
        file_id: file.id,
        file_name: file.name,
    }))
}

/// One spooled upload. The local copy is removed when this guard drops,
/// whether the relay succeeded or not.
struct ReceivedFile {
    path: PathBuf,
    file_name: String,
    mime_type: String,
}

impl ReceivedFile {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ReceivedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "Failed to remove spooled upload: {}", e);
        }
    }
}

/// Pull the `file` field out of the multipart body and spool it to disk.
async fn spool_file(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<Option<ReceivedFile>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadMultipart(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or("upload.bin")
            .to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadMultipart(e.to_string()))?;

        let dir = &state.config().upload_dir;
        tokio::fs::create_dir_all(dir).await.map_err(ApiError::Spool)?;

        let path = dir.join(Uuid::new_v4().to_string());
        tokio::fs::write(&path, &data).await.map_err(ApiError::Spool)?;

        return Ok(Some(ReceivedFile {
            path,
            file_name,
            mime_type,
        }));
    }

    Ok(None)
}
