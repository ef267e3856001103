//! Language documents: list, read, replace, delete, tokenize, assign ids.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use super::{error_response, find_session, ok, ApiResponse};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/{id}/languages", get(list_languages))
        .route(
            "/sessions/{id}/languages/{lang}",
            get(get_document).put(put_document).delete(delete_document),
        )
        .route("/sessions/{id}/languages/{lang}/tokenize", post(tokenize))
        .route("/sessions/{id}/languages/{lang}/ids", post(assign_ids))
}

async fn list_languages(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let languages = session.document.lock().get_document_languages();
    ok(serde_json::json!({ "languages": languages }))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path((id, lang)): Path<(String, String)>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let doc = session.document.lock();
    ok(serde_json::json!({
        "language": lang,
        "body": doc.get_document_per_language(&lang),
    }))
}

/// PUT /api/sessions/{id}/languages/{lang}: store the raw TEI body. An empty
/// body adds the language from the template instead.
async fn put_document(
    State(state): State<Arc<AppState>>,
    Path((id, lang)): Path<(String, String)>,
    body: String,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    if body.trim().is_empty() {
        if let Err(e) = doc.add_language(&lang) {
            return error_response(&e);
        }
    } else {
        doc.update_document_per_language(&lang, body);
    }
    info!("Session {}: stored '{}' document", id, lang);
    ok(serde_json::json!({
        "language": lang,
        "languages": doc.get_document_languages(),
    }))
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path((id, lang)): Path<(String, String)>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    doc.delete_document_per_language(&lang);
    ok(serde_json::json!({ "deleted": true, "languages": doc.get_document_languages() }))
}

async fn tokenize(
    State(state): State<Arc<AppState>>,
    Path((id, lang)): Path<(String, String)>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    match doc.tokenize_language(&lang) {
        Ok(changed) => ok(serde_json::json!({ "language": lang, "changed": changed })),
        Err(e) => error_response(&e),
    }
}

async fn assign_ids(
    State(state): State<Arc<AppState>>,
    Path((id, lang)): Path<(String, String)>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    match doc.ensure_ids(&lang) {
        Ok(assigned) => (
            if assigned.is_empty() { StatusCode::OK } else { StatusCode::CREATED },
            Json(serde_json::json!({ "language": lang, "assigned": assigned })),
        ),
        Err(e) => error_response(&e),
    }
}
