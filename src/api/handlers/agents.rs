use crate::{
    AppState,
    agents::{AgentConfig, RunGuard, bridge::generate_run_id},
    types::{AgentInput, AgentRequest, AgentResponse, AgentResult, AgentRun, AgentType, AppError, Result},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::time::Instant;
use tracing::warn;
use utoipa::ToSchema;

/// An agent configuration with its current health
#[derive(Debug, Serialize, ToSchema)]
pub struct AgentInfo {
    #[serde(flatten)]
    pub config: AgentConfig,
    pub healthy: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentListResponse {
    pub agents: Vec<AgentInfo>,
    pub total: usize,
    pub healthy: usize,
}

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    pub limit: Option<usize>,
}

const DEFAULT_RUNS_LIMIT: usize = 50;

/// Parse a path agent id, reporting unknown ids the way the direct routes do
fn parse_agent_id(agent_id: &str) -> Result<AgentType> {
    agent_id
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Unknown agent: {}", agent_id)))
}

fn service_unavailable(body: serde_json::Value) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
}

/// List enabled agents with their health
#[utoipa::path(
    get,
    path = "/api/agents",
    responses((status = 200, description = "Enabled agents", body = AgentListResponse)),
    tag = "agents"
)]
pub async fn list_agents(State(state): State<AppState>) -> Json<AgentListResponse> {
    let mut agents = Vec::new();
    for config in state.agent_registry.available_agents() {
        let healthy = state.agent_registry.is_healthy(config.agent_type).await;
        agents.push(AgentInfo { config, healthy });
    }

    let healthy = agents.iter().filter(|a| a.healthy).count();
    Json(AgentListResponse {
        total: agents.len(),
        healthy,
        agents,
    })
}

/// Run an agent through the bridge
#[utoipa::path(
    post,
    path = "/api/agents/run",
    request_body = AgentRequest,
    responses(
        (status = 200, description = "Run finished (see result.ok)", body = AgentResponse),
        (status = 400, description = "Unsupported agent type"),
        (status = 503, description = "Agent unhealthy or dependencies missing")
    ),
    tag = "agents"
)]
pub async fn run_agent(
    State(state): State<AppState>,
    Json(request): Json<AgentRequest>,
) -> Result<Response> {
    if request.agent_type.trim().is_empty() {
        return Err(AppError::InvalidInput("Invalid agent type".to_string()));
    }
    let agent_type: AgentType = request.agent_type.parse()?;

    if !state.agent_registry.is_healthy(agent_type).await {
        return Ok(service_unavailable(json!({
            "error": format!("Agent {} is not available", agent_type)
        })));
    }

    let deps = state.agent_registry.check_dependencies(agent_type).await;
    if !deps.available {
        let names: Vec<&str> = deps.missing.iter().map(AgentType::as_str).collect();
        return Ok(service_unavailable(json!({
            "error": format!("Missing dependencies: {}", names.join(", ")),
            "missingDependencies": deps.missing,
        })));
    }

    let response = state.bridge.run(request).await?;
    Ok(Json(response).into_response())
}

/// Recent runs, newest first
#[utoipa::path(
    get,
    path = "/api/agents/runs",
    params(("limit" = Option<usize>, Query, description = "Maximum runs to return (default 50)")),
    responses((status = 200, description = "Run history", body = [AgentRun])),
    tag = "agents"
)]
pub async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Json<Vec<AgentRun>> {
    Json(
        state
            .bridge
            .runs()
            .recent(query.limit.unwrap_or(DEFAULT_RUNS_LIMIT)),
    )
}

/// One run by id
#[utoipa::path(
    get,
    path = "/api/agents/runs/{id}",
    params(("id" = String, Path, description = "Run id")),
    responses(
        (status = 200, description = "Run", body = AgentRun),
        (status = 404, description = "Unknown run")
    ),
    tag = "agents"
)]
pub async fn get_run(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<AgentRun>> {
    state
        .bridge
        .runs()
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Run '{}' not found", id)))
}

/// Direct call to one agent, bypassing the health and dependency checks
#[utoipa::path(
    post,
    path = "/api/agents/{agent_id}/execute",
    request_body = AgentInput,
    params(("agent_id" = String, Path, description = "content, code, research, design or data")),
    responses(
        (status = 200, description = "Agent result", body = AgentResult),
        (status = 400, description = "Unknown agent")
    ),
    tag = "agents"
)]
pub async fn execute_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(input): Json<AgentInput>,
) -> Result<Json<AgentResult>> {
    let agent_type = parse_agent_id(&agent_id)?;
    Ok(Json(state.agent_registry.run_agent(agent_type, &input).await))
}

/// Dedicated content route; failures are reported with 400
#[utoipa::path(
    post,
    path = "/api/agents/content",
    request_body = AgentInput,
    responses(
        (status = 200, description = "Content generated", body = AgentResult),
        (status = 400, description = "Content agent failed", body = AgentResult)
    ),
    tag = "agents"
)]
pub async fn run_content(State(state): State<AppState>, Json(input): Json<AgentInput>) -> Response {
    let result = state.agent_registry.run_agent(AgentType::Content, &input).await;
    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(result)).into_response()
}

/// Dedicated code route; failures are reported with 500
#[utoipa::path(
    post,
    path = "/api/agents/code",
    request_body = AgentInput,
    responses(
        (status = 200, description = "Code generated", body = AgentResult),
        (status = 500, description = "Code agent failed", body = AgentResult)
    ),
    tag = "agents"
)]
pub async fn run_code(State(state): State<AppState>, Json(input): Json<AgentInput>) -> Response {
    let result = state.agent_registry.run_agent(AgentType::Code, &input).await;
    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(result)).into_response()
}

fn sse_event<T: Serialize>(name: &'static str, data: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(data)
        .unwrap_or_else(|_| Event::default().event(name))
}

/// Stream an agent run as server-sent events.
///
/// Events: `start` (`{runId, agentType}`), repeated `chunk` (`{text}`),
/// then `done` with the final result, or `error` with a failed result.
#[utoipa::path(
    post,
    path = "/api/agents/{agent_id}/stream",
    request_body = AgentInput,
    params(("agent_id" = String, Path, description = "content, code, research, design or data")),
    responses(
        (status = 200, description = "text/event-stream of start, chunk, done or error"),
        (status = 400, description = "Unknown agent")
    ),
    tag = "agents"
)]
pub async fn stream_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(input): Json<AgentInput>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let agent_type = parse_agent_id(&agent_id)?;

    let run_id = generate_run_id();
    let registry = state.agent_registry.clone();
    // Completes the record as cancelled if the client disconnects first
    let guard = RunGuard::start(state.bridge.runs().clone(), &run_id, agent_type, &input);

    let stream = async_stream::stream! {
        let started = Instant::now();
        yield Ok(sse_event("start", &json!({ "runId": guard.id(), "agentType": agent_type })));

        match registry.stream_agent(agent_type, &input).await {
            Err(result) => {
                guard.finish(&result);
                yield Ok(sse_event("error", &result));
            }
            Ok(agent_stream) => {
                let provider = agent_stream.provider;
                let mut chunks = agent_stream.chunks;
                let mut output = String::new();
                let mut failure = None;

                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(text) => {
                            output.push_str(&text);
                            yield Ok(sse_event("chunk", &json!({ "text": text })));
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                // Release the concurrency permit before reporting
                drop(chunks);

                let elapsed = started.elapsed().as_millis() as u64;
                let result = match failure {
                    None => AgentResult::success(agent_type, output, provider, elapsed),
                    Some(e) => {
                        warn!(run_id = %run_id, agent = %agent_type, error = %e, "Agent stream failed");
                        let code = registry
                            .get_entry(agent_type)
                            .map(|entry| entry.agent.error_code())
                            .unwrap_or("EXECUTION_ERROR");
                        AgentResult::failure(agent_type, e.message(), Some(code), elapsed)
                    }
                };

                guard.finish(&result);
                let name = if result.is_ok() { "done" } else { "error" };
                yield Ok(sse_event(name, &result));
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
