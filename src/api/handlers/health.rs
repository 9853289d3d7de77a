use crate::{AppState, cache::CacheStats, types::now_rfc3339};
use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Value, json};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentHealthSummary {
    pub total: usize,
    pub healthy: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when every enabled agent is healthy, otherwise `degraded`
    pub status: String,
    pub agents: AgentHealthSummary,
    pub cache: CacheStats,
    pub timestamp: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/ping",
    responses((status = 200, description = "Server is up")),
    tag = "health"
)]
pub async fn ping() -> Json<Value> {
    Json(json!({ "ok": true, "now": now_rfc3339() }))
}

/// Agent health and cache statistics
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Health summary", body = HealthResponse)),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let total = state.agent_registry.available_agents().len();
    let healthy = state.agent_registry.healthy_agents().await.len();

    Json(HealthResponse {
        status: if healthy == total { "ok" } else { "degraded" }.to_string(),
        agents: AgentHealthSummary { total, healthy },
        cache: state.cache.stats(),
        timestamp: now_rfc3339(),
    })
}
