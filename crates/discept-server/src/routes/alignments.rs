//! Alignment links between two languages of a session's document.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use discept_model::{AlignmentLink, Category};
use serde::Deserialize;
use tracing::info;

use super::{error_response, find_session, ok, ApiResponse};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/sessions/{id}/alignments/{lang_a}/{lang_b}",
            get(list_alignments).post(add_alignment),
        )
        .route(
            "/sessions/{id}/alignments/{lang_a}/{lang_b}/auto",
            post(apply_auto_alignment),
        )
        .route(
            "/sessions/{id}/alignments/{lang_a}/{lang_b}/{index}",
            delete(delete_alignment),
        )
}

#[derive(Debug, Deserialize)]
struct AddAlignmentRequest {
    a: Vec<String>,
    b: Vec<String>,
    #[serde(default)]
    category: Category,
}

fn pair_response(lang_a: &str, lang_b: &str, links: Vec<AlignmentLink>) -> serde_json::Value {
    serde_json::json!({
        "langA": lang_a,
        "langB": lang_b,
        "alignments": links,
    })
}

async fn list_alignments(
    State(state): State<Arc<AppState>>,
    Path((id, lang_a, lang_b)): Path<(String, String, String)>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let links = session.document.lock().get_alignments(&lang_a, &lang_b);
    ok(pair_response(&lang_a, &lang_b, links))
}

async fn add_alignment(
    State(state): State<Arc<AppState>>,
    Path((id, lang_a, lang_b)): Path<(String, String, String)>,
    Json(req): Json<AddAlignmentRequest>,
) -> ApiResponse {
    if req.a.is_empty() || req.b.is_empty() || lang_a == lang_b {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "An alignment needs ids on both sides of two different languages",
            })),
        );
    }
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    doc.add_alignment(&lang_a, &lang_b, req.a, req.b, req.category);
    (
        StatusCode::CREATED,
        Json(pair_response(&lang_a, &lang_b, doc.get_alignments(&lang_a, &lang_b))),
    )
}

async fn delete_alignment(
    State(state): State<Arc<AppState>>,
    Path((id, lang_a, lang_b, index)): Path<(String, String, String, usize)>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    doc.delete_alignment(&lang_a, &lang_b, index);
    ok(pair_response(&lang_a, &lang_b, doc.get_alignments(&lang_a, &lang_b)))
}

/// POST /api/sessions/{id}/alignments/{a}/{b}/auto: merge an aligner result
/// (`teiCorpus` body) into the pair.
async fn apply_auto_alignment(
    State(state): State<Arc<AppState>>,
    Path((id, lang_a, lang_b)): Path<(String, String, String)>,
    body: String,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    match doc.apply_aligned_corpus(&lang_a, &lang_b, &body) {
        Ok(added) => {
            info!("Session {}: merged {} aligned links", id, added);
            ok(serde_json::json!({
                "added": added,
                "alignments": doc.get_alignments(&lang_a, &lang_b),
            }))
        }
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::routes::tests::{call_json, test_app};

    #[tokio::test]
    async fn test_alignment_endpoints_normalize_order() {
        let app = test_app();
        let session = app.state.create_session();
        let base = format!("/api/sessions/{}/alignments", session.id);

        let first = r#"{"a":["e1","e2"],"b":["d1"],"category":"Semantic"}"#;
        let (status, _) =
            call_json(&app.router, Method::POST, &format!("{}/en/de", base), Some(first.into())).await;
        assert_eq!(status, StatusCode::CREATED);
        let second = r#"{"a":["d2"],"b":["e3"]}"#;
        call_json(&app.router, Method::POST, &format!("{}/de/en", base), Some(second.into())).await;

        let (_, listed) = call_json(&app.router, Method::GET, &format!("{}/de/en", base), None).await;
        assert_eq!(listed["alignments"][0]["a"], serde_json::json!(["d1"]));
        assert_eq!(listed["alignments"][0]["category"], "Semantic");
        assert_eq!(listed["alignments"][1]["category"], "Linguistic");

        let (_, after) =
            call_json(&app.router, Method::DELETE, &format!("{}/en/de/0", base), None).await;
        assert_eq!(after["alignments"].as_array().unwrap().len(), 1);
        assert_eq!(after["alignments"][0]["a"], serde_json::json!(["e3"]));

        let (status, _) = call_json(
            &app.router,
            Method::POST,
            &format!("{}/en/de", base),
            Some(r#"{"a":[],"b":["d1"]}"#.into()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_auto_alignment_rejects_garbage() {
        let app = test_app();
        let session = app.state.create_session();
        let uri = format!("/api/sessions/{}/alignments/it/en/auto", session.id);
        let (status, err) =
            call_json(&app.router, Method::POST, &uri, Some("no corpus here".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["kind"], "invalid");
    }
}
