//! Message types for model communication
//!
//! Defines the request/response shapes exchanged with the generation
//! endpoint through `GenerativeModel`.

use serde::{Deserialize, Serialize};

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instructions that frame the conversation
    System,
    /// End-user turn
    User,
    /// Model turn
    Model,
}

/// A single conversational message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Sampling parameters forwarded to the endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
            top_p: None,
            top_k: None,
        }
    }
}

/// A complete generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    pub contents: Vec<Message>,
    pub generation_config: GenerationConfig,
}

impl ModelRequest {
    /// Single user-turn request
    pub fn from_prompt(prompt: impl Into<String>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Message::user(prompt)],
            generation_config,
        }
    }

    /// Total characters across all messages
    pub fn prompt_chars(&self) -> usize {
        self.contents.iter().map(|m| m.content.chars().count()).sum()
    }
}

/// Generated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
}

impl ModelResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
