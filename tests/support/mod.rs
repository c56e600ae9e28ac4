//! Fake model backends shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use docquery::errors::{RagError, Result};
use docquery::model::GenerativeModel;
use docquery::types::{ModelRequest, ModelResponse};

const RELEVANCE_MARKER: &str = "RELEVANT or NOT RELEVANT";

fn prompt_text(request: &ModelRequest) -> String {
    request
        .contents
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered sections of a relevance prompt, in order
pub fn relevance_sections(prompt: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut n = 1;
    let mut rest = prompt;

    while let Some(start) = rest.find(&format!("Section {}:\n", n)) {
        let body = &rest[start + format!("Section {}:\n", n).len()..];
        let end = body
            .find(&format!("\n\nSection {}:\n", n + 1))
            .unwrap_or(body.len());
        sections.push(body[..end].trim().to_string());
        rest = &body[end..];
        n += 1;
    }

    sections
}

/// Marks a section relevant when it mentions `keyword`; answers synthesis
/// prompts with a fixed reply
pub struct KeywordModel {
    keyword: String,
    answer: String,
    calls: AtomicUsize,
    synthesis_prompts: Mutex<Vec<String>>,
}

impl KeywordModel {
    pub fn new(keyword: &str, answer: &str) -> Arc<Self> {
        Arc::new(Self {
            keyword: keyword.to_lowercase(),
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
            synthesis_prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn synthesis_prompts(&self) -> Vec<String> {
        self.synthesis_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for KeywordModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = prompt_text(request);

        if prompt.contains(RELEVANCE_MARKER) {
            let verdicts = relevance_sections(&prompt)
                .iter()
                .map(|section| {
                    if section.to_lowercase().contains(&self.keyword) {
                        "RELEVANT"
                    } else {
                        "NOT RELEVANT"
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(ModelResponse::new(verdicts));
        }

        self.synthesis_prompts.lock().unwrap().push(prompt);
        Ok(ModelResponse::new(self.answer.clone()))
    }
}

/// Fails with a 429 for the first `failures` calls, then replies
pub struct FlakyModel {
    failures: usize,
    reply: String,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl FlakyModel {
    pub fn new(failures: usize, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            failures,
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for FlakyModel {
    async fn generate(&self, _request: &ModelRequest) -> Result<ModelResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());

        if n < self.failures {
            Err(RagError::ApiStatus {
                status: 429,
                message: "Too Many Requests".to_string(),
            })
        } else {
            Ok(ModelResponse::new(self.reply.clone()))
        }
    }
}

/// Every call fails with the same non-transient server error
pub struct BrokenModel {
    calls: AtomicUsize,
}

impl BrokenModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeModel for BrokenModel {
    async fn generate(&self, _request: &ModelRequest) -> Result<ModelResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RagError::ApiStatus {
            status: 500,
            message: "INTERNAL: backend unavailable".to_string(),
        })
    }
}

/// Never answers
pub struct HangingModel {
    calls: AtomicUsize,
}

impl HangingModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeModel for HangingModel {
    async fn generate(&self, _request: &ModelRequest) -> Result<ModelResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<Result<ModelResponse>>().await
    }
}
