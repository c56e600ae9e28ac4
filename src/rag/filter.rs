//! Relevance filtering, the first retrieval phase
//!
//! Chunks are sent to the model in fixed-size batches, sequentially, with a
//! fixed pause between batches. The model answers one line per chunk:
//!
//! ```text
//! RELEVANT
//! NOT RELEVANT
//! RELEVANT
//! ```
//!
//! Line `i` (ignoring blank lines) is the verdict for `batch[i]`. Lines that
//! cannot be read as a verdict, and missing lines, count as not relevant.
//! A batch whose call fails is skipped. If nothing survives, the first
//! `batch_size` chunks are returned so synthesis always has input.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{RagError, Result};
use crate::model::ResilientModelClient;
use crate::rag::prompts::PromptTemplates;
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{Chunk, GenerationConfig, ModelRequest, RelevanceVerdict};

/// Chunks per relevance call
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Pause between consecutive relevance calls
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(1000);

/// Whether a single response line is a positive verdict
fn is_relevant_line(line: &str) -> bool {
    let upper = line.to_uppercase();
    upper.contains("RELEVANT")
        && !upper.contains("NOT RELEVANT")
        && !upper.contains("NOT_RELEVANT")
        && !upper.contains("NOT-RELEVANT")
        && !upper.contains("IRRELEVANT")
}

/// Read one verdict per chunk from a model response
///
/// Always returns exactly `batch_len` verdicts, in batch order.
pub fn parse_verdicts(response: &str, batch_len: usize) -> Vec<RelevanceVerdict> {
    let mut lines = response.lines().map(str::trim).filter(|l| !l.is_empty());

    (0..batch_len)
        .map(|chunk_index_in_batch| RelevanceVerdict {
            chunk_index_in_batch,
            relevant: lines.next().map(is_relevant_line).unwrap_or(false),
        })
        .collect()
}

/// First RAG phase: batch, ask, keep what the model marks relevant
pub struct RelevanceFilter {
    client: Arc<ResilientModelClient>,
    batch_size: usize,
    inter_batch_delay: Duration,
    prompts: PromptTemplates,
    generation_config: GenerationConfig,
    telemetry: Option<TelemetryCollector>,
}

impl RelevanceFilter {
    /// Create filter with default batching and a low-temperature config
    pub fn new(client: Arc<ResilientModelClient>) -> Self {
        Self {
            client,
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
            prompts: PromptTemplates::default(),
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 256,
                top_p: None,
                top_k: None,
            },
            telemetry: None,
        }
    }

    /// Batch size; values below 1 are treated as 1
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.generation_config = generation_config;
        self
    }

    pub fn with_telemetry(mut self, collector: TelemetryCollector) -> Self {
        self.telemetry = Some(collector);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn record(&self, event: TelemetryEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event);
        }
    }

    /// Keep the chunks the model marks relevant, in input order
    ///
    /// Batch failures are absorbed. The only error returned is
    /// `RagError::Cancelled`.
    pub async fn filter_relevant(
        &self,
        chunks: &[Chunk],
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Chunk>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let mut relevant: Vec<Chunk> = Vec::new();

        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            if batch_index > 0 && !self.inter_batch_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RagError::Cancelled),
                    _ = sleep(self.inter_batch_delay) => {}
                }
            }

            let request = ModelRequest::from_prompt(
                self.prompts.relevance_prompt(batch, query),
                self.generation_config.clone(),
            );

            match self.client.call(&request, cancel).await {
                Ok(response) => {
                    let verdicts = parse_verdicts(&response.text, batch.len());
                    let before = relevant.len();
                    relevant.extend(
                        verdicts
                            .iter()
                            .filter(|v| v.relevant)
                            .map(|v| batch[v.chunk_index_in_batch].clone()),
                    );
                    let kept = relevant.len() - before;

                    debug!(batch_index, batch_len = batch.len(), kept, "Relevance batch done");
                    self.record(TelemetryEvent::BatchFiltered {
                        batch_index,
                        relevant: kept,
                        timestamp: Instant::now(),
                    });
                }
                Err(RagError::Cancelled) => return Err(RagError::Cancelled),
                Err(e) => {
                    warn!(batch_index, error = %e, "Skipping relevance batch");
                    self.record(TelemetryEvent::BatchSkipped {
                        batch_index,
                        kind: e.kind(),
                        timestamp: Instant::now(),
                    });
                }
            }
        }

        if relevant.is_empty() {
            let fallback: Vec<Chunk> = chunks.iter().take(self.batch_size).cloned().collect();
            warn!(
                chunks = fallback.len(),
                "No chunk marked relevant, falling back to leading chunks"
            );
            self.record(TelemetryEvent::FallbackUsed {
                chunks: fallback.len(),
                timestamp: Instant::now(),
            });
            return Ok(fallback);
        }

        Ok(relevant)
    }
}
