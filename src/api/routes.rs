use crate::AppState;
use crate::api::handlers::{agents, artifacts, bridge, health, tools};
use crate::api::ApiDoc;
use axum::{
    Json, Router,
    routing::{get, post},
};
use utoipa::OpenApi;

/// Routes mounted under `/api`
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(health::ping))
        .route("/health", get(health::health))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        // Agents
        .route("/agents", get(agents::list_agents))
        .route("/agents/run", post(agents::run_agent))
        .route("/agents/runs", get(agents::list_runs))
        .route("/agents/runs/{id}", get(agents::get_run))
        .route("/agents/content", post(agents::run_content))
        .route("/agents/code", post(agents::run_code))
        .route("/agents/{agent_id}/execute", post(agents::execute_agent))
        .route("/agents/{agent_id}/stream", post(agents::stream_agent))
        // Tools
        .route("/tools", get(tools::list_tools))
        .route("/tools/web-search", post(tools::web_search))
        .route("/tools/veo3-video", post(tools::veo3_video))
        .route("/tools/orchestrate", post(tools::orchestrate))
        // Artifacts
        .route("/artifacts/save", post(artifacts::save_artifact))
        .route("/artifacts/list", get(artifacts::list_artifacts))
        // Python backend passthrough
        .route(
            "/bridge/{*path}",
            get(bridge::forward_get).post(bridge::forward_post),
        )
}
