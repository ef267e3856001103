//! Import and export of merged TEI.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{info, warn};

use super::{error_response, find_session, ok, ApiResponse};
use crate::state::AppState;

const TEI_CONTENT_TYPE: &str = "application/tei+xml; charset=utf-8";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/{id}/import", post(import_tei))
        .route("/sessions/{id}/import/{lang}", post(import_language))
        .route("/sessions/{id}/export", get(export_tei))
        .route("/sessions/{id}/export/save", post(save_export))
}

/// POST /api/sessions/{id}/import: replace the session's document with a
/// merged TEI file. A plain TEI file fails with kind `no-discept`, which a
/// client may answer by importing it as a language instead.
async fn import_tei(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: String,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    match doc.parse_tei_string(&body) {
        Ok(()) => {
            info!("Session {}: imported {} bytes of TEI", id, body.len());
            ok(serde_json::json!({ "summary": doc.summary() }))
        }
        Err(e) => {
            warn!("Session {}: import failed: {}", id, e);
            error_response(&e)
        }
    }
}

/// POST /api/sessions/{id}/import/{lang}: add a plain TEI file as `lang`
/// (`auto` detects the language from the file).
async fn import_language(
    State(state): State<Arc<AppState>>,
    Path((id, lang)): Path<(String, String)>,
    body: String,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let language = (lang != "auto").then_some(lang.as_str());
    let mut doc = session.document.lock();
    match doc.import_foreign(&body, language) {
        Ok(language) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "language": language,
                "languages": doc.get_document_languages(),
            })),
        ),
        Err(e) => error_response(&e),
    }
}

/// GET /api/sessions/{id}/export: the merged TEI document.
async fn export_tei(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response.into_response(),
    };
    let generated = session.document.lock().generate_tei();
    match generated {
        Ok(xml) => ([(header::CONTENT_TYPE, TEI_CONTENT_TYPE)], xml).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST /api/sessions/{id}/export/save: write the merged TEI document to
/// `exports/<session>.xml` in the data directory.
async fn save_export(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let generated = session.document.lock().generate_tei();
    let xml = match generated {
        Ok(xml) => xml,
        Err(e) => return error_response(&e),
    };

    let path = state
        .config
        .data_paths
        .exports
        .join(format!("{}.xml", session.id));
    match tokio::fs::write(&path, &xml).await {
        Ok(()) => {
            info!("Session {}: saved export to {}", id, path.display());
            ok(serde_json::json!({
                "path": path.to_string_lossy(),
                "bytes": xml.len(),
            }))
        }
        Err(e) => error_response(&e.into()),
    }
}
