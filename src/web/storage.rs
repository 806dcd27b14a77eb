use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path as UrlPath, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, warn};

use crate::{
    store::http::guess_mime,
    web::{ApiMessage, AppState, auth::require_session, json_error},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/attachments/:key/:name", get(download_attachment))
}

/// Ensure the attachment storage directory exists.
pub async fn ensure_storage_root(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("failed to ensure storage root at {}", path.display()))
}

/// Accept a single path segment only if sanitizing leaves it untouched.
fn clean_segment(segment: &str) -> Option<&str> {
    let sanitized = sanitize_filename::sanitize(segment);
    (!segment.is_empty() && sanitized == segment && segment != "." && segment != "..")
        .then_some(segment)
}

async fn download_attachment(
    State(state): State<AppState>,
    jar: CookieJar,
    UrlPath((key, name)): UrlPath<(String, String)>,
) -> Result<Response, (StatusCode, Json<ApiMessage>)> {
    if require_session(&state, &jar).await.is_err() {
        return Err(json_error(
            StatusCode::UNAUTHORIZED,
            "Veuillez vous connecter.",
        ));
    }

    let (Some(key), Some(name)) = (clean_segment(&key), clean_segment(&name)) else {
        warn!(%key, %name, "rejected attachment path");
        return Err(json_error(StatusCode::NOT_FOUND, "Justificatif introuvable."));
    };

    let path = state.config().attachments_dir.join(key).join(name);
    let content_type = guess_mime(name);
    stream_file(&path, name, content_type.as_ref()).await
}

/// Stream a file inline so the preview modal can display it.
pub async fn stream_file(
    path: &Path,
    filename: &str,
    content_type: &str,
) -> Result<Response, (StatusCode, Json<ApiMessage>)> {
    let bytes = tokio::fs::read(path).await.map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            return json_error(StatusCode::NOT_FOUND, "Justificatif introuvable.");
        }
        error!(?err, file = %path.display(), "failed to read attachment");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Lecture du justificatif impossible.",
        )
    })?;

    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(content_type).map_err(|_| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Type de contenu invalide.",
        )
    })?;
    headers.insert(header::CONTENT_TYPE, content_type);
    let disposition = format!("inline; filename=\"{}\"", filename);
    let disposition = HeaderValue::from_str(&disposition).map_err(|_| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "En-tête de téléchargement invalide.",
        )
    })?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((headers, bytes).into_response())
}
