//! Prompt templates for the relevance and synthesis calls
//!
//! Templates are plain strings with `{query}` and `{sections}` placeholders
//! so deployments can reword them without touching the engine.

use serde::{Deserialize, Serialize};

use crate::types::Chunk;

const DEFAULT_RELEVANCE_TEMPLATE: &str = "\
You are screening document sections for a question.

Question: {query}

For each numbered section below, answer on its own line, in order, with exactly \
RELEVANT or NOT RELEVANT. Output one line per section and nothing else.

{sections}";

const DEFAULT_SYNTHESIS_TEMPLATE: &str = "\
Answer the question using only the document sections below. Each section starts \
with the name of its source document in square brackets. Cite sources by that name. \
If the answer is not contained in the sections, say so explicitly.

{sections}

Question: {query}";

/// Configurable prompt wording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub relevance: String,
    pub synthesis: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            relevance: DEFAULT_RELEVANCE_TEMPLATE.to_string(),
            synthesis: DEFAULT_SYNTHESIS_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Prompt asking for one verdict line per chunk of the batch
    pub fn relevance_prompt(&self, batch: &[Chunk], query: &str) -> String {
        let sections = batch
            .iter()
            .enumerate()
            .map(|(i, chunk)| format!("Section {}:\n{}", i + 1, chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        render(&self.relevance, query, &sections)
    }

    /// Prompt with `[sourceName]`-tagged sections followed by the question
    pub fn synthesis_prompt(&self, chunks: &[Chunk], query: &str) -> String {
        let sections = chunks
            .iter()
            .map(|chunk| format!("[{}]\n{}", chunk.source_name, chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        render(&self.synthesis, query, &sections)
    }

    /// Names of placeholders missing from either template
    pub fn missing_placeholders(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for (name, template) in [("relevance", &self.relevance), ("synthesis", &self.synthesis)] {
            for placeholder in ["{query}", "{sections}"] {
                if !template.contains(placeholder) {
                    missing.push(format!("{} template lacks {}", name, placeholder));
                }
            }
        }
        missing
    }
}

/// Substitute sections first so a query containing "{sections}" stays literal
fn render(template: &str, query: &str, sections: &str) -> String {
    match template.split_once("{query}") {
        Some((before, after)) => format!(
            "{}{}{}",
            before.replace("{sections}", sections),
            query,
            after.replace("{sections}", sections)
        ),
        None => template.replace("{sections}", sections),
    }
}
