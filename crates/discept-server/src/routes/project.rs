//! Project record of a session's document.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use discept_model::ProjectMetadata;

use super::{find_session, ok, ApiResponse};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/{id}/project", get(get_project).put(put_project))
}

async fn get_project(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let doc = session.document.lock();
    ok(serde_json::json!({ "project": doc.project(), "changed": doc.is_changed() }))
}

/// PUT /api/sessions/{id}/project: replace the whole record.
async fn put_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(project): Json<ProjectMetadata>,
) -> ApiResponse {
    let session = match find_session(&state, &id) {
        Ok(s) => s,
        Err(response) => return response,
    };
    let mut doc = session.document.lock();
    doc.set_project(project);
    ok(serde_json::json!({ "project": doc.project(), "changed": true }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::routes::tests::{call_json, test_app};

    #[tokio::test]
    async fn test_project_replace() {
        let app = test_app();
        let session = app.state.create_session();
        let uri = format!("/api/sessions/{}/project", session.id);

        let body = r#"{"title":"Aeneid","authors":"Vergil","pubStatement":"CC0","editor":"me"}"#;
        let (status, put) = call_json(&app.router, Method::PUT, &uri, Some(body.into())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(put["project"]["editor"], "me");

        let (_, got) = call_json(&app.router, Method::GET, &uri, None).await;
        assert_eq!(got["project"]["title"], "Aeneid");
        assert_eq!(got["project"]["pubStatement"], "CC0");
        assert_eq!(got["changed"], true);
    }
}
