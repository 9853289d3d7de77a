//! Google Gemini client
//!
//! Talks to the Generative Language REST API with `reqwest`. Authentication
//! uses the `x-goog-api-key` header so the key never appears in URLs or logs.

use crate::llm::client::{LLMClient, TextStream};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }

    pub fn with_generation_config(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    fn build_payload(&self, system: Option<&str>, prompt: &str) -> Value {
        let mut payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens
            }
        });

        if let Some(system) = system.filter(|s| !s.is_empty()) {
            payload["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        payload
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::LLM(format!(
                "Gemini API error {}: {}",
                status.as_u16(),
                body
            )));
        }

        Ok(response)
    }

    /// Send a raw `generateContent` payload and return the response body
    pub async fn generate_content(&self, payload: &Value) -> Result<Value> {
        let response = self.post(&self.endpoint("generateContent"), payload).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Invalid Gemini response: {}", e)))?;

        if let Some(error) = body.get("error") {
            return Err(AppError::LLM(format!("Gemini API error: {}", error)));
        }

        Ok(body)
    }

    /// Concatenate `candidates[0].content.parts[*].text`
    pub fn extract_text(body: &Value) -> Option<String> {
        let parts = body
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)?;

        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();

        Some(text)
    }

    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let body = self.generate_content(&self.build_payload(system, prompt)).await?;

        match Self::extract_text(&body) {
            Some(text) => Ok(text),
            None => {
                let reason = body
                    .pointer("/promptFeedback/blockReason")
                    .and_then(Value::as_str)
                    .unwrap_or("no candidates");
                Err(AppError::LLM(format!("Gemini returned no content: {}", reason)))
            }
        }
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete(None, prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.complete(Some(system), prompt).await
    }

    async fn stream_with_system(&self, system: &str, prompt: &str) -> Result<TextStream> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(&url, &self.build_payload(Some(system), prompt)).await?;
        let mut bytes = Box::pin(response.bytes_stream());

        let stream = async_stream::stream! {
            // Bytes, not text: a UTF-8 sequence can straddle two chunks
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(AppError::LLM(format!("Gemini stream error: {}", e)));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    if let Some(text) = parse_sse_line(&String::from_utf8_lossy(&line)) {
                        yield Ok(text);
                    }
                }
            }

            if let Some(text) = parse_sse_line(&String::from_utf8_lossy(&buffer)) {
                yield Ok(text);
            }
        };

        Ok(Box::new(Box::pin(stream)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Text delta carried by one `data:` line, if any
fn parse_sse_line(line: &str) -> Option<String> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    let body: Value = serde_json::from_str(data).ok()?;
    GeminiClient::extract_text(&body).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(
            "key".to_string(),
            "http://localhost:1/v1beta/".to_string(),
            "gemini-1.5-flash".to_string(),
        )
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            client().endpoint("generateContent"),
            "http://localhost:1/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_payload_includes_system_instruction() {
        let payload = client().build_payload(Some("be terse"), "hi");
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(payload["systemInstruction"]["parts"][0]["text"], "be terse");

        let bare = client().build_payload(None, "hi");
        assert!(bare.get("systemInstruction").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello, " }, { "text": "world" }] }
            }]
        });
        assert_eq!(GeminiClient::extract_text(&body).as_deref(), Some("Hello, world"));
        assert!(GeminiClient::extract_text(&json!({})).is_none());
    }

    #[test]
    fn test_parse_sse_line() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"chunk"}]}}]}"#;
        assert_eq!(parse_sse_line(line).as_deref(), Some("chunk"));
        assert_eq!(parse_sse_line(""), None);
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line("data: [DONE]"), None);
    }
}
