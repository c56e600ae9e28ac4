//! Remote generation endpoint client
//!
//! `GenerativeModel` is the single `generate` operation the engine needs.
//! `GeminiClient` implements it over HTTP:
//! - Endpoint: POST {base_url}/models/{model}:generateContent
//! - No retries and no request deadline here; see `ResilientModelClient`

use crate::errors::{RagError, Result};
use crate::types::{ModelRequest, ModelResponse, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Default Gemini API endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// TCP connect timeout; the overall deadline is raced by the caller
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A remote text generation endpoint
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate text for the given messages
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse>;

    /// Name used in logs
    fn name(&self) -> &str {
        "model"
    }
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create client against the public endpoint and default model
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(DEFAULT_BASE_URL, DEFAULT_MODEL, api_key)
    }

    /// Create client with custom endpoint and model
    pub fn with_config(base_url: &str, model: &str, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::ConfigError("API key must not be empty".to_string()));
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the JSON body; system messages become `system_instruction`
    fn build_request_body(request: &ModelRequest) -> Value {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for message in &request.contents {
            match message.role {
                Role::System => system_parts.push(&message.content),
                Role::User => contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": message.content }],
                })),
                Role::Model => contents.push(json!({
                    "role": "model",
                    "parts": [{ "text": message.content }],
                })),
            }
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": request.generation_config,
        });

        if !system_parts.is_empty() {
            body["system_instruction"] = json!({
                "parts": [{ "text": system_parts.join("\n\n") }]
            });
        }

        body
    }

    /// Concatenate the text parts of the first candidate
    fn parse_response(body: &Value) -> Result<ModelResponse> {
        let parts = body["candidates"]
            .get(0)
            .and_then(|candidate| candidate["content"]["parts"].as_array());

        let text: String = match parts {
            Some(parts) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect(),
            None => String::new(),
        };

        if text.is_empty() {
            if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
                return Err(RagError::MalformedResponse(format!(
                    "prompt blocked: {}",
                    reason
                )));
            }
            return Err(RagError::MalformedResponse(
                "response contained no candidate text".to_string(),
            ));
        }

        Ok(ModelResponse::new(text))
    }

    /// Pull `status: message` out of an error body, falling back to the raw text
    fn error_message(body_text: &str) -> String {
        match serde_json::from_str::<Value>(body_text) {
            Ok(value) => {
                let status = value["error"]["status"].as_str();
                let message = value["error"]["message"].as_str();
                match (status, message) {
                    (Some(status), Some(message)) => format!("{}: {}", status, message),
                    (None, Some(message)) => message.to_string(),
                    _ => body_text.to_string(),
                }
            }
            Err(_) => body_text.to_string(),
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let body = Self::build_request_body(request);

        debug!(
            model = self.model.as_str(),
            prompt_chars = request.prompt_chars(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            return Err(RagError::ApiStatus {
                status: status.as_u16(),
                message: Self::error_message(&body_text),
            });
        }

        let value: Value = serde_json::from_str(&body_text)?;
        Self::parse_response(&value)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
