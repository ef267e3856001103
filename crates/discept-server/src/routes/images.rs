//! Images attached to a language document.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use discept_model::{Image, ImageType};
use serde::Deserialize;

use super::{error_response, find_session, ok, ApiResponse};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/sessions/{id}/languages/{lang}/images",
            get(list_images).post(add_image).put(replace_images),
        )
        .route(
            "/sessions/{id}/languages/{lang}/images/{index}",
            delete(delete_image),
        )
}

#[derive(Debug, Deserialize)]
struct AddImageRequest {
    id: String,
    #[serde(default)]
    ids: Vec<String>,
    url: String,
    #[serde(rename = "type", default)]
    image_type: ImageType,
}

async fn list_images(
    State(state): State<Arc<AppState>>,
    Path((id, lang)): Path<(String, String)>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let doc = session.document.lock();
    ok(serde_json::json!({ "language": lang, "images": doc.get_images(&lang) }))
}

async fn add_image(
    State(state): State<Arc<AppState>>,
    Path((id, lang)): Path<(String, String)>,
    Json(req): Json<AddImageRequest>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    match doc.add_image(&lang, req.id, req.ids, req.url, req.image_type) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "language": lang, "images": doc.get_images(&lang) })),
        ),
        Err(e) => error_response(&e),
    }
}

/// PUT /api/sessions/{id}/languages/{lang}/images: replace the whole list.
async fn replace_images(
    State(state): State<Arc<AppState>>,
    Path((id, lang)): Path<(String, String)>,
    Json(images): Json<Vec<Image>>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    match doc.set_images(&lang, images) {
        Ok(()) => ok(serde_json::json!({ "language": lang, "images": doc.get_images(&lang) })),
        Err(e) => error_response(&e),
    }
}

async fn delete_image(
    State(state): State<Arc<AppState>>,
    Path((id, lang, index)): Path<(String, String, usize)>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    doc.delete_image(&lang, index);
    ok(serde_json::json!({ "language": lang, "images": doc.get_images(&lang) }))
}
