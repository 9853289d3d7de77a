//! Python backend bridge
//!
//! A thin HTTP client for the Flask service that sits next to the dashboard.
//! [`BackendClient::fetch`] never fails: transport problems come back as
//! `ok: false, status: 0` so callers can render them directly.

use crate::types::{AppError, Result};
use crate::utils::toml_config::AxonConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use utoipa::ToSchema;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub path: String,
    pub method: Method,
    /// `None` values are left out of the query string
    pub query: Vec<(String, Option<String>)>,
    pub body: Option<Value>,
    pub headers: HashMap<String, String>,
    pub timeout_ms: Option<u64>,
}

impl BackendRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            query: Vec::new(),
            body: None,
            headers: HashMap::new(),
            timeout_ms: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get(path)
        }
    }

    pub fn with_query(mut self, key: &str, value: Option<String>) -> Self {
        self.query.push((key.to_string(), value));
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendResponse {
    pub ok: bool,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

/// Body of a passed-through response
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardedBody {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: ForwardedBody,
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

fn is_json(content_type: &str) -> bool {
    content_type.contains("application/json")
}

impl BackendClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &AxonConfig) -> Self {
        Self::new(http, config.backend_url(), config.backend.timeout_ms)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` against the base URL, keeping any base path prefix.
    /// The result must stay on the backend origin and under the base path.
    fn build_url(&self, path: &str, query: &[(String, Option<String>)]) -> Result<Url> {
        let base = Url::parse(&format!("{}/", self.base_url.trim_end_matches('/')))
            .map_err(|e| AppError::Configuration(format!("Invalid backend URL: {}", e)))?;
        let mut url = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::InvalidInput(format!("Invalid backend path: {}", e)))?;

        if url.origin() != base.origin() || !url.path().starts_with(base.path()) {
            warn!(path = %path, "Rejected backend path outside the base URL");
            return Err(AppError::InvalidInput(
                "Backend path must stay under the configured backend URL".to_string(),
            ));
        }

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    pub async fn fetch(&self, request: BackendRequest) -> BackendResponse {
        match self.try_fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Backend request failed");
                BackendResponse {
                    ok: false,
                    status: 0,
                    error: Some(e.message().to_string()),
                    ..Default::default()
                }
            }
        }
    }

    async fn try_fetch(&self, request: BackendRequest) -> Result<BackendResponse> {
        let url = self.build_url(&request.path, &request.query)?;
        debug!(method = %request.method, url = %url, "Backend request");

        let timeout = request
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.timeout);
        let mut builder = self
            .http
            .request(request.method, url)
            .timeout(timeout)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if is_json(&content_type) {
            let data: Value = response.json().await?;
            Ok(BackendResponse {
                ok: status.is_success(),
                status: status.as_u16(),
                data: Some(data),
                ..Default::default()
            })
        } else {
            let text = response.text().await?;
            Ok(BackendResponse {
                ok: status.is_success(),
                status: status.as_u16(),
                error: (!status.is_success()).then(|| text.clone()),
                raw_text: Some(text),
                data: None,
            })
        }
    }

    pub async fn send_message(&self, message: &str) -> BackendResponse {
        self.fetch(BackendRequest::post("/send_message", json!({ "message": message })))
            .await
    }

    pub async fn get_tasks(&self) -> BackendResponse {
        self.fetch(BackendRequest::get("/get_tasks")).await
    }

    pub async fn get_dashboard(&self) -> BackendResponse {
        self.fetch(BackendRequest::get("/api/dashboard")).await
    }

    /// Pass a request through unchanged and return the upstream status,
    /// content type and body. Only transport failures are errors.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<String>,
    ) -> Result<ForwardedResponse> {
        let query: Vec<(String, Option<String>)> = query
            .iter()
            .map(|(k, v)| (k.clone(), Some(v.clone())))
            .collect();
        let url = self.build_url(path, &query)?;
        debug!(method = %method, url = %url, "Forwarding to backend");

        let mut builder = self.http.request(method, url).timeout(self.timeout);
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = if is_json(&content_type) {
            ForwardedBody::Json(response.json().await?)
        } else {
            ForwardedBody::Text(response.text().await?)
        };

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }
}

impl Default for BackendClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), DEFAULT_BACKEND_URL, DEFAULT_TIMEOUT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_skips_none_query() {
        let client = BackendClient::default();
        let url = client
            .build_url(
                "/get_tasks",
                &[
                    ("status".to_string(), Some("open".to_string())),
                    ("owner".to_string(), None),
                ],
            )
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/get_tasks?status=open");
    }

    #[test]
    fn test_build_url_keeps_base_path() {
        let client = BackendClient::new(reqwest::Client::new(), "http://host:8000/py/", 1000);
        let url = client.build_url("api/dashboard", &[]).unwrap();
        assert_eq!(url.as_str(), "http://host:8000/py/api/dashboard");
    }

    #[test]
    fn test_build_url_rejects_other_origins() {
        let client = BackendClient::default();
        for path in [
            "http://evil.example/x",
            "\\\\evil.example/x",
            "https://127.0.0.1:5000/get_tasks",
        ] {
            let err = client.build_url(path, &[]).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "{} was accepted", path);
        }
    }

    #[test]
    fn test_build_url_rejects_climbing_above_base_path() {
        let client = BackendClient::new(reqwest::Client::new(), "http://host:8000/py/", 1000);
        for path in ["../secret", "api/../../secret", "%2e%2e/secret"] {
            assert!(
                matches!(client.build_url(path, &[]), Err(AppError::InvalidInput(_))),
                "{} was accepted",
                path
            );
        }
        let url = client.build_url("api/../get_tasks", &[]).unwrap();
        assert_eq!(url.as_str(), "http://host:8000/py/get_tasks");
    }

    #[test]
    fn test_build_url_invalid_base() {
        let client = BackendClient::new(reqwest::Client::new(), "not a url", 1000);
        assert!(client.build_url("x", &[]).is_err());
    }

    #[tokio::test]
    async fn test_fetch_transport_error_never_fails() {
        let client = BackendClient::new(reqwest::Client::new(), "http://127.0.0.1:1", 500);
        let response = client.get_tasks().await;
        assert!(!response.ok);
        assert_eq!(response.status, 0);
        assert!(response.error.is_some());
    }
}
