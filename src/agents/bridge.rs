//! Agent bridge
//!
//! Turns a string-typed [`AgentRequest`] into a registry run, keeping a
//! bounded in-memory history of runs.

use crate::agents::AgentRegistry;
use crate::types::{AgentInput, AgentRequest, AgentResponse, AgentResult, AgentRun, AgentStatus, AgentType, Result};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Bounded run history, newest first
pub struct RunLog {
    runs: RwLock<VecDeque<AgentRun>>,
    capacity: usize,
}

impl RunLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            runs: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Record a run that has just started
    pub fn record(&self, id: &str, agent_type: AgentType, input: &AgentInput) {
        let now = Utc::now();
        let run = AgentRun {
            id: id.to_string(),
            agent_type,
            input: input.clone(),
            result: None,
            status: AgentStatus::Running,
            created_at: now,
            started_at: Some(now),
            completed_at: None,
            error: None,
        };

        let mut runs = self.runs.write();
        runs.push_front(run);
        runs.truncate(self.capacity);
    }

    /// Attach the result to a recorded run. A run already evicted from
    /// the history is ignored.
    pub fn complete(&self, id: &str, result: &AgentResult) {
        let mut runs = self.runs.write();
        if let Some(run) = runs.iter_mut().find(|r| r.id == id) {
            run.status = result.status();
            run.error = result.error_message().map(str::to_string);
            run.result = Some(result.clone());
            run.completed_at = Some(Utc::now());
        }
    }

    pub fn get(&self, id: &str) -> Option<AgentRun> {
        self.runs.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn recent(&self, limit: usize) -> Vec<AgentRun> {
        self.runs.read().iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

/// `run_{millis}_{9 alphanumerics}`
pub fn generate_run_id() -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(9)
        .collect();
    format!("run_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// A recorded run that has not finished yet.
///
/// Dropping it before [`RunGuard::finish`] (a client that hung up, a
/// cancelled request) completes the record as `CANCELLED`, so no run stays
/// `running` forever.
pub struct RunGuard {
    runs: Arc<RunLog>,
    id: String,
    agent_type: AgentType,
    started: Instant,
    finished: bool,
}

impl RunGuard {
    /// Record `id` as running
    pub fn start(runs: Arc<RunLog>, id: &str, agent_type: AgentType, input: &AgentInput) -> Self {
        runs.record(id, agent_type, input);
        Self {
            runs,
            id: id.to_string(),
            agent_type,
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn finish(mut self, result: &AgentResult) {
        self.runs.complete(&self.id, result);
        self.finished = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(run_id = %self.id, agent = %self.agent_type, "Run dropped before completion");
        let result = AgentResult::failure(
            self.agent_type,
            "Run was cancelled before it completed",
            Some("CANCELLED"),
            self.started.elapsed().as_millis() as u64,
        );
        self.runs.complete(&self.id, &result);
    }
}

pub struct AgentBridge {
    registry: Arc<AgentRegistry>,
    runs: Arc<RunLog>,
}

impl AgentBridge {
    pub fn new(registry: Arc<AgentRegistry>, runs: Arc<RunLog>) -> Self {
        Self { registry, runs }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn runs(&self) -> &Arc<RunLog> {
        &self.runs
    }

    /// Dispatch `request` to its agent.
    ///
    /// Only an unsupported agent type is an `Err`; agent failures are
    /// reported in the returned result.
    pub async fn run(&self, request: AgentRequest) -> Result<AgentResponse> {
        let agent_type: AgentType = request.agent_type.parse()?;
        let run_id = generate_run_id();

        let guard = RunGuard::start(Arc::clone(&self.runs), &run_id, agent_type, &request.input);
        info!(run_id = %run_id, agent = %agent_type, "Agent run started");

        let result = self
            .registry
            .run_agent_with_timeout(agent_type, &request.input, request.options.timeout_ms)
            .await;

        guard.finish(&result);
        let status = result.status();
        info!(run_id = %run_id, agent = %agent_type, status = ?status, "Agent run finished");

        Ok(AgentResponse {
            run_id,
            result,
            status,
        })
    }
}
