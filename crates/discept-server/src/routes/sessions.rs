//! Session lifecycle: open, list, inspect, close.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::{find_session, ok, ApiResponse};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
}

/// POST /api/sessions: open a session on the demo document.
async fn create_session(State(state): State<Arc<AppState>>) -> ApiResponse {
    let session = state.create_session();
    let summary = session.document.lock().summary();
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": session.id, "summary": summary })),
    )
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> ApiResponse {
    let sessions = state.list_sessions();
    ok(serde_json::json!({
        "total": sessions.len(),
        "sessions": sessions,
    }))
}

/// GET /api/sessions/{id}: document summary.
async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let summary = session.document.lock().summary();
    ok(serde_json::json!({ "id": id, "summary": summary }))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResponse {
    if state.remove_session(&id) {
        ok(serde_json::json!({ "deleted": true, "id": id }))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Session not found", "kind": "not-found" })),
        )
    }
}
