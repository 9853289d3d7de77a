use crate::{
    AppState,
    backend::{ForwardedBody, ForwardedResponse},
    types::AppError,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use reqwest::Method;
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

fn into_response(forwarded: ForwardedResponse) -> Response {
    let status = StatusCode::from_u16(forwarded.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = match forwarded.body {
        ForwardedBody::Json(value) => (status, Json(value)).into_response(),
        ForwardedBody::Text(text) => (status, text).into_response(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded.content_type) {
        if !forwarded.content_type.is_empty() {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
    }
    response
}

async fn forward(
    state: &AppState,
    method: Method,
    path: &str,
    query: HashMap<String, String>,
    body: Option<String>,
) -> Response {
    let label = method.as_str().to_string();
    let query: Vec<(String, String)> = query.into_iter().collect();

    match state.backend.forward(method, path, &query, body).await {
        Ok(forwarded) => into_response(forwarded),
        Err(e @ AppError::InvalidInput(_)) => {
            warn!(path = %path, "Rejected bridge path");
            e.into_response()
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Backend passthrough failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": format!("Bridge {} failed: {}", label, e.message()) })),
            )
                .into_response()
        }
    }
}

/// `GET /api/bridge/{*path}`
pub async fn forward_get(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    forward(&state, Method::GET, &path, query, None).await
}

/// `POST /api/bridge/{*path}`
pub async fn forward_post(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    forward(&state, Method::POST, &path, query, Some(body)).await
}
