//! HTTP route handlers over per-session alignment documents.

pub mod alignments;
pub mod documents;
pub mod images;
pub mod project;
pub mod sessions;
pub mod transfer;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{Json, Router};
use discept_core::Error;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::{AppState, Session};

pub type ApiResponse = (StatusCode, Json<Value>);

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(sessions::routes())
        .merge(project::routes())
        .merge(documents::routes())
        .merge(images::routes())
        .merge(alignments::routes())
        .merge(transfer::routes())
}

pub(crate) fn ok(value: Value) -> ApiResponse {
    (StatusCode::OK, Json(value))
}

/// Map a model error to a status code, keeping its short `kind` for clients.
pub(crate) fn error_response(e: &Error) -> ApiResponse {
    let status = match e {
        Error::InvalidFormat(_) | Error::NotAlignmentModel | Error::InvalidDocument { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Json(_) => StatusCode::BAD_REQUEST,
        Error::Io(_) | Error::Config(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({ "error": e.to_string(), "kind": e.kind() })),
    )
}

/// Resolve a session id or produce the 404 response.
pub(crate) fn find_session(state: &AppState, id: &str) -> Result<Arc<Session>, ApiResponse> {
    state.session(id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Session not found", "kind": "not-found" })),
        )
    })
}
