//! Answer synthesis, the second retrieval phase

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::Result;
use crate::model::ResilientModelClient;
use crate::rag::prompts::PromptTemplates;
use crate::types::{Chunk, GenerationConfig, ModelRequest};

/// Answer text plus the documents it was grounded on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synthesis {
    pub answer: String,
    pub sources_used: BTreeSet<String>,
}

/// Builds one citation-aware prompt and makes exactly one model call
pub struct AnswerSynthesizer {
    client: Arc<ResilientModelClient>,
    prompts: PromptTemplates,
    generation_config: GenerationConfig,
}

impl AnswerSynthesizer {
    pub fn new(client: Arc<ResilientModelClient>) -> Self {
        Self {
            client,
            prompts: PromptTemplates::default(),
            generation_config: GenerationConfig::default(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.generation_config = generation_config;
        self
    }

    /// Answer `query` from `chunks`
    ///
    /// `sources_used` comes from the chunks themselves, never from the
    /// model's text.
    pub async fn synthesize(
        &self,
        chunks: &[Chunk],
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Synthesis> {
        let sources_used: BTreeSet<String> =
            chunks.iter().map(|c| c.source_name.clone()).collect();

        let request = ModelRequest::from_prompt(
            self.prompts.synthesis_prompt(chunks, query),
            self.generation_config.clone(),
        );

        let response = self.client.call(&request, cancel).await?;

        debug!(
            chunks = chunks.len(),
            sources = sources_used.len(),
            answer_chars = response.text.len(),
            "Synthesis complete"
        );

        Ok(Synthesis {
            answer: response.text.trim().to_string(),
            sources_used,
        })
    }
}
