use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// ============= Agent Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Content,
    Code,
    Research,
    Design,
    Data,
}

impl AgentType {
    /// Every agent type, in registry display order.
    pub const ALL: [AgentType; 5] = [
        AgentType::Content,
        AgentType::Code,
        AgentType::Research,
        AgentType::Design,
        AgentType::Data,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Content => "content",
            AgentType::Code => "code",
            AgentType::Research => "research",
            AgentType::Design => "design",
            AgentType::Data => "data",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        AgentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unsupported agent type: {}", s)))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Running,
    Completed,
    Error,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentPriority {
    Low,
    Medium,
    High,
    Urgent,
}

// ============= Agent Input =============

/// Input accepted by every agent.
///
/// The well-known fields are typed; anything else the dashboard sends
/// (`prompt`, `tone`, `language`, ...) lands in `extra` and is read through
/// the accessor helpers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<AgentPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl AgentInput {
    /// Build an input carrying only a prompt.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::default().with_field("prompt", Value::String(prompt.into()))
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// The trimmed prompt, or an empty string when absent.
    pub fn prompt(&self) -> &str {
        self.str_field("prompt").map(str::trim).unwrap_or("")
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }

    pub fn bool_field(&self, name: &str) -> bool {
        self.extra.get(name).and_then(Value::as_bool).unwrap_or(false)
    }
}

// ============= Agent Results =============

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Text,
    Image,
    File,
    Data,
    Code,
}

/// A file, image or data blob produced by an agent run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentArtifact {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessAgentResult {
    pub ok: bool,
    pub agent_type: AgentType,
    pub execution_time: u64,
    pub timestamp: String,
    pub output: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<AgentArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAgentResult {
    pub ok: bool,
    pub agent_type: AgentType,
    pub execution_time: u64,
    pub timestamp: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

/// Outcome of one agent run. `ok` discriminates the two shapes on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AgentResult {
    Success(SuccessAgentResult),
    Error(ErrorAgentResult),
}

impl AgentResult {
    pub fn success(
        agent_type: AgentType,
        output: String,
        provider: impl Into<String>,
        execution_time: u64,
    ) -> Self {
        AgentResult::Success(SuccessAgentResult {
            ok: true,
            agent_type,
            execution_time,
            timestamp: now_rfc3339(),
            output,
            provider: provider.into(),
            artifacts: Vec::new(),
            metadata: None,
        })
    }

    pub fn failure(
        agent_type: AgentType,
        error: impl Into<String>,
        error_code: Option<&str>,
        execution_time: u64,
    ) -> Self {
        AgentResult::Error(ErrorAgentResult {
            ok: false,
            agent_type,
            execution_time,
            timestamp: now_rfc3339(),
            error: error.into(),
            error_code: error_code.map(str::to_string),
            metadata: None,
        })
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AgentResult::Success(_))
    }

    pub fn agent_type(&self) -> AgentType {
        match self {
            AgentResult::Success(r) => r.agent_type,
            AgentResult::Error(r) => r.agent_type,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            AgentResult::Success(_) => None,
            AgentResult::Error(r) => Some(&r.error),
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            AgentResult::Success(_) => None,
            AgentResult::Error(r) => r.error_code.as_deref(),
        }
    }

    pub fn output(&self) -> Option<&str> {
        match self {
            AgentResult::Success(r) => Some(&r.output),
            AgentResult::Error(_) => None,
        }
    }

    pub fn status(&self) -> AgentStatus {
        if self.is_ok() {
            AgentStatus::Completed
        } else {
            AgentStatus::Error
        }
    }
}

// ============= Requests / Runs =============

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequestOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<AgentPriority>,
    #[serde(default)]
    pub return_artifacts: bool,
}

/// Unified request accepted by the bridge.
///
/// `agent_type` stays a string so an unsupported type can be reported
/// with the name the caller used.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    #[serde(default)]
    pub agent_type: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub input: AgentInput,
    #[serde(default)]
    pub options: AgentRequestOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub run_id: String,
    pub result: AgentResult,
    pub status: AgentStatus,
}

/// Record of one run kept for history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentRun {
    pub id: String,
    pub agent_type: AgentType,
    #[schema(value_type = Object)]
    pub input: AgentInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AgentResult>,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub parameters: Value,
}

/// Current time in the RFC 3339 form used by every wire timestamp.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The message without the variant prefix, as returned to clients.
    pub fn message(&self) -> &str {
        match self {
            AppError::Configuration(msg)
            | AppError::InvalidInput(msg)
            | AppError::NotFound(msg)
            | AppError::Upstream(msg)
            | AppError::LLM(msg)
            | AppError::Storage(msg)
            | AppError::QuotaExceeded(msg)
            | AppError::Timeout(msg)
            | AppError::Internal(msg) => msg,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Configuration(_)
            | AppError::LLM(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else {
            AppError::Upstream(err.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.message()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
