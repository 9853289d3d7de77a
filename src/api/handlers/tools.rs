use crate::{
    AppState,
    tools::{ToolExecution, concatenate},
    types::{Result, ToolDefinition},
};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub num_results: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VideoRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrchestrateRequest {
    pub sequence: Vec<ToolExecution>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrchestrateResponse {
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<Value>,
    /// Results rendered as one text block
    pub combined: String,
}

/// Definitions of every registered tool
#[utoipa::path(
    get,
    path = "/api/tools",
    responses((status = 200, description = "Tool definitions", body = [ToolDefinition])),
    tag = "tools"
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDefinition>> {
    Json(state.tool_registry.get_tool_definitions())
}

/// Cached web search (quota checked first)
#[utoipa::path(
    post,
    path = "/api/tools/web-search",
    request_body = WebSearchRequest,
    responses(
        (status = 200, description = "Search results with source cache or live"),
        (status = 400, description = "Query missing"),
        (status = 429, description = "Daily quota exceeded"),
        (status = 500, description = "SerpAPI key not configured"),
        (status = 502, description = "SerpAPI failed")
    ),
    tag = "tools"
)]
pub async fn web_search(
    State(state): State<AppState>,
    Json(request): Json<WebSearchRequest>,
) -> Result<Json<Value>> {
    let mut args = json!({ "query": request.query });
    if let Some(n) = request.num_results {
        args["numResults"] = json!(n);
    }
    Ok(Json(state.tool_registry.execute("web_search", args).await?))
}

/// Video generation
#[utoipa::path(
    post,
    path = "/api/tools/veo3-video",
    request_body = VideoRequest,
    responses(
        (status = 200, description = "Video URL"),
        (status = 400, description = "Prompt missing"),
        (status = 500, description = "Runway key not configured"),
        (status = 502, description = "Video API failed")
    ),
    tag = "tools"
)]
pub async fn veo3_video(
    State(state): State<AppState>,
    Json(request): Json<VideoRequest>,
) -> Result<Json<Value>> {
    let args = json!({
        "prompt": request.prompt,
        "duration": request.duration.unwrap_or(10),
    });
    Ok(Json(state.tool_registry.execute("veo3_video", args).await?))
}

/// Run a tool sequence in order
#[utoipa::path(
    post,
    path = "/api/tools/orchestrate",
    request_body = OrchestrateRequest,
    responses(
        (status = 200, description = "Per-step results", body = OrchestrateResponse),
        (status = 404, description = "Unknown tool in sequence")
    ),
    tag = "tools"
)]
pub async fn orchestrate(
    State(state): State<AppState>,
    Json(request): Json<OrchestrateRequest>,
) -> Result<Json<OrchestrateResponse>> {
    let results = state.orchestrator.execute_tool_sequence(&request.sequence).await?;
    let combined = concatenate(&results);
    Ok(Json(OrchestrateResponse { results, combined }))
}
