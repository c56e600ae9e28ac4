//! Scripted `GenerativeModel` for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::errors::{RagError, Result};
use crate::model::GenerativeModel;
use crate::types::{ModelRequest, ModelResponse};

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Status(u16, String),
    Fail(String),
    Malformed,
    /// Never completes
    Hang,
}

impl Step {
    pub fn reply(text: &str) -> Self {
        Step::Reply(text.to_string())
    }

    pub fn rate_limited() -> Self {
        Step::Status(429, "Too Many Requests".to_string())
    }
}

/// Replays steps in order; the last step repeats forever
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn always(step: Step) -> Arc<Self> {
        Self::new(vec![step])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap_or(Step::Malformed)
        } else {
            steps.front().cloned().unwrap_or(Step::Malformed)
        }
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        let prompt: Vec<&str> = request.contents.iter().map(|m| m.content.as_str()).collect();
        self.prompts.lock().unwrap().push(prompt.join("\n"));

        match self.next_step() {
            Step::Reply(text) => Ok(ModelResponse::new(text)),
            Step::Status(status, message) => Err(RagError::ApiStatus { status, message }),
            Step::Fail(message) => Err(RagError::Generic(message)),
            Step::Malformed => Err(RagError::MalformedResponse("no candidates".to_string())),
            Step::Hang => std::future::pending::<Result<ModelResponse>>().await,
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
