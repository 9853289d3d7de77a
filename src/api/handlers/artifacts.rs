use crate::{
    AppState,
    artifacts::{ArtifactRecord, SaveArtifact},
    types::AppError,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// `{ok: false, error}` with the status of the failure
fn failure(err: AppError) -> Response {
    let status = match err {
        AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(error = %err, "Artifact request failed");
    (status, Json(json!({ "ok": false, "error": err.message() }))).into_response()
}

/// Save an agent output
#[utoipa::path(
    post,
    path = "/api/artifacts/save",
    request_body = SaveArtifact,
    responses(
        (status = 200, description = "Saved; file (file store) or id (Supabase)"),
        (status = 400, description = "Missing required fields"),
        (status = 500, description = "Storage failure")
    ),
    tag = "artifacts"
)]
pub async fn save_artifact(
    State(state): State<AppState>,
    Json(request): Json<SaveArtifact>,
) -> Response {
    match state.artifacts.save(request).await {
        Ok(saved) => {
            let mut body = json!({ "ok": true });
            if let Some(file) = saved.file {
                body["file"] = json!(file);
            }
            if let Some(id) = saved.id {
                body["id"] = json!(id);
            }
            Json(body).into_response()
        }
        Err(e) => failure(e),
    }
}

/// Most recent artifacts first
#[utoipa::path(
    get,
    path = "/api/artifacts/list",
    params(("limit" = Option<usize>, Query, description = "Maximum items (default from config)")),
    responses(
        (status = 200, description = "Saved artifacts", body = [ArtifactRecord]),
        (status = 500, description = "Storage failure")
    ),
    tag = "artifacts"
)]
pub async fn list_artifacts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or_else(|| state.config_manager.config().artifacts.list_limit);

    match state.artifacts.list(limit).await {
        Ok(items) => Json(json!({ "ok": true, "items": items })).into_response(),
        Err(e) => failure(e),
    }
}
