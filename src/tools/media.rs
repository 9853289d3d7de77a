//! Media generation tools: video through Runway (Veo 3) and images through
//! Gemini's image-capable model.

use crate::llm::GeminiClient;
use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::error;

const DEFAULT_VIDEO_DURATION: u64 = 10;
const IMAGE_STYLES: [&str; 3] = ["photorealistic", "illustrative", "artistic"];

fn required_prompt<'a>(args: &'a Value, message: &str) -> Result<&'a str> {
    args.get("prompt")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::InvalidInput(message.to_string()))
}

// ============= Veo 3 Video =============

pub struct Veo3VideoTool {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    key_env: String,
}

impl Veo3VideoTool {
    pub fn new(http: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            key_env: "RUNWAY_API_KEY".to_string(),
        }
    }

    pub fn with_key_env(mut self, key_env: String) -> Self {
        self.key_env = key_env;
        self
    }
}

#[async_trait]
impl Tool for Veo3VideoTool {
    fn name(&self) -> &str {
        "veo3_video"
    }

    fn description(&self) -> &str {
        "Generate videos from text prompts"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string", "description": "What the video should show" },
                "duration": {
                    "type": "integer",
                    "description": "Length in seconds",
                    "default": DEFAULT_VIDEO_DURATION
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let started = Instant::now();
        let prompt = required_prompt(&args, "Prompt is required for video generation.")?;
        let duration = args
            .get("duration")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_VIDEO_DURATION);

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration(format!("{} is not configured on the server.", self.key_env))
        })?;

        let response = self
            .http
            .post(format!("{}/generation", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({
                "prompt": prompt,
                "model": "veo-3",
                "duration": duration,
            }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Veo3 API error");
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Failed to generate video from Veo3.");
            return Err(AppError::Upstream(message.to_string()));
        }

        Ok(json!({
            "videoUrl": body.get("video_url").cloned().unwrap_or(Value::Null),
            "executionTime": started.elapsed().as_millis() as u64,
        }))
    }
}

// ============= Gemini Vision (image generation) =============

pub struct GeminiVisionTool {
    client: Option<GeminiClient>,
}

impl GeminiVisionTool {
    /// `client` should target an image-capable model; `None` disables the tool
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self { client }
    }
}

/// Split a generateContent response into inline images and text
fn collect_media(body: &Value) -> (Vec<Value>, String) {
    let mut images = Vec::new();
    let mut text = String::new();

    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array);

    for part in parts.into_iter().flatten() {
        if let Some(inline) = part.get("inlineData") {
            images.push(json!({
                "mimeType": inline.get("mimeType").cloned().unwrap_or(json!("image/png")),
                "data": inline.get("data").cloned().unwrap_or(Value::Null),
            }));
        } else if let Some(t) = part.get("text").and_then(Value::as_str) {
            text.push_str(t);
        }
    }

    (images, text)
}

#[async_trait]
impl Tool for GeminiVisionTool {
    fn name(&self) -> &str {
        "gemini_vision"
    }

    fn description(&self) -> &str {
        "Generate images from text descriptions"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string", "description": "Image description" },
                "style": { "type": "string", "enum": IMAGE_STYLES }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let started = Instant::now();
        let prompt = required_prompt(&args, "Prompt is required for image generation.")?;

        let style = args.get("style").and_then(Value::as_str);
        if let Some(style) = style {
            if !IMAGE_STYLES.contains(&style) {
                return Err(AppError::InvalidInput(format!(
                    "Unsupported image style: {}",
                    style
                )));
            }
        }

        let client = self.client.as_ref().ok_or_else(|| {
            AppError::Configuration("Gemini API key not configured on server".to_string())
        })?;

        let text = match style {
            Some(style) => format!("{}\n\nStyle: {}", prompt, style),
            None => prompt.to_string(),
        };

        let body = client
            .generate_content(&json!({
                "contents": [{ "role": "user", "parts": [{ "text": text }] }],
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
            }))
            .await?;

        let (images, text) = collect_media(&body);
        if images.is_empty() {
            return Err(AppError::Upstream(
                "Gemini returned no image for the prompt".to_string(),
            ));
        }

        let mut output = json!({
            "images": images,
            "executionTime": started.elapsed().as_millis() as u64,
        });
        if !text.is_empty() {
            output["text"] = json!(text);
        }
        Ok(output)
    }
}
