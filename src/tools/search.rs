//! Web search tool backed by SerpAPI
//!
//! Results are cached under `web_search:{query}` so repeated searches from
//! the dashboard or the content agent do not spend API credits twice. An
//! explicit `numResults` gets its own entry, `web_search#{n}:{query}`.

use crate::cache::ToolCache;
use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One organic search result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

pub struct WebSearchTool {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    key_env: String,
    engine: String,
    cache: Arc<ToolCache>,
    ttl: Option<Duration>,
}

impl WebSearchTool {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        cache: Arc<ToolCache>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            key_env: "SERPAPI_API_KEY".to_string(),
            engine: "google".to_string(),
            cache,
            ttl: None,
        }
    }

    pub fn with_engine(mut self, engine: String) -> Self {
        self.engine = engine;
        self
    }

    /// Env var name reported when the key is missing
    pub fn with_key_env(mut self, key_env: String) -> Self {
        self.key_env = key_env;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    async fn search_live(&self, api_key: &str, query: &str, num: Option<u64>) -> Result<Value> {
        info!(query = %query, "Performing live web search");

        let mut params: Vec<(&str, String)> = vec![
            ("engine", self.engine.clone()),
            ("q", query.to_string()),
            ("api_key", api_key.to_string()),
        ];
        if let Some(n) = num {
            params.push(("num", n.to_string()));
        }

        let response = self
            .http
            .get(format!("{}/search.json", self.base_url))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(AppError::Upstream(format!("SerpAPI error: {}", error)));
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "SerpAPI returned status {}",
                status.as_u16()
            )));
        }

        Ok(json!({ "results": parse_organic_results(&body) }))
    }
}

/// Map SerpAPI `organic_results` to `{title, link, snippet}`
pub fn parse_organic_results(body: &Value) -> Vec<SearchResult> {
    let field = |item: &Value, name: &str| {
        item.get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    body.get("organic_results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| SearchResult {
                    title: field(item, "title"),
                    link: field(item, "link"),
                    snippet: field(item, "snippet"),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for real-time information"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "numResults": {
                    "type": "integer",
                    "description": "Maximum number of results to request"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let started = Instant::now();

        let query = args
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Query is required for web search.".to_string(),
            ));
        }

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration(format!("{} is not configured on the server.", self.key_env))
        })?;

        let num = args.get("numResults").and_then(Value::as_u64);
        let key = match num {
            Some(n) => ToolCache::compute_key(&format!("{}#{}", self.name(), n), query),
            None => ToolCache::compute_key(self.name(), query),
        };

        let cached = self
            .cache
            .get_or_insert_with(&key, self.ttl, || self.search_live(api_key, query, num))
            .await?;

        if cached.from_cache {
            debug!(query = %query, "Web search cache hit");
        }

        let mut output = cached.value;
        output["source"] = json!(if cached.from_cache { "cache" } else { "live" });
        output["executionTime"] = json!(started.elapsed().as_millis() as u64);
        Ok(output)
    }
}
