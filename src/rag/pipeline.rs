//! End-to-end query orchestration: validate -> chunk -> filter -> synthesize

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{ErrorKind, RagError, Result};
use crate::model::ResilientModelClient;
use crate::rag::chunker::DEFAULT_MAX_CHUNK_SIZE;
use crate::rag::filter::{RelevanceFilter, DEFAULT_BATCH_SIZE};
use crate::rag::pool::DocumentPool;
use crate::rag::prompts::PromptTemplates;
use crate::rag::state::{QueryStage, StageEvent};
use crate::rag::synthesis::{AnswerSynthesizer, Synthesis};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{Document, GenerationConfig, QueryResult};

/// RAG pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum characters per chunk
    pub max_chunk_size: usize,
    /// Chunks per relevance call
    pub batch_size: usize,
    /// Pause between relevance calls
    pub inter_batch_delay_ms: u64,
    /// Sampling temperature for relevance calls
    pub filter_temperature: f32,
    /// Output budget for relevance calls
    pub filter_max_output_tokens: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay_ms: 1000,
            filter_temperature: 0.1,
            filter_max_output_tokens: 256,
        }
    }
}

impl RagConfig {
    fn filter_generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.filter_temperature,
            max_output_tokens: self.filter_max_output_tokens,
            top_p: None,
            top_k: None,
        }
    }
}

/// Coordinates one query from documents to cited answer
///
/// Holds no per-query state; one instance can serve concurrent queries.
pub struct RagQueryOrchestrator {
    filter: RelevanceFilter,
    synthesizer: AnswerSynthesizer,
    config: RagConfig,
    telemetry: Option<TelemetryCollector>,
}

impl RagQueryOrchestrator {
    /// Create orchestrator with default configuration
    pub fn new(client: Arc<ResilientModelClient>) -> Self {
        Self::with_config(client, RagConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(client: Arc<ResilientModelClient>, config: RagConfig) -> Self {
        let filter = RelevanceFilter::new(client.clone())
            .with_batch_size(config.batch_size)
            .with_inter_batch_delay(Duration::from_millis(config.inter_batch_delay_ms))
            .with_generation_config(config.filter_generation_config());

        Self {
            filter,
            synthesizer: AnswerSynthesizer::new(client),
            config,
            telemetry: None,
        }
    }

    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.filter = self.filter.with_prompts(prompts.clone());
        self.synthesizer = self.synthesizer.with_prompts(prompts);
        self
    }

    /// Sampling parameters for the synthesis call
    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.synthesizer = self.synthesizer.with_generation_config(generation_config);
        self
    }

    pub fn with_telemetry(mut self, collector: TelemetryCollector) -> Self {
        self.filter = self.filter.with_telemetry(collector.clone());
        self.telemetry = Some(collector);
        self
    }

    /// Get current configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Answer a question; never fails, errors are folded into the result
    pub async fn answer_query(&self, query: &str, documents: &[Document]) -> QueryResult {
        self.answer_query_with_cancel(query, documents, CancellationToken::new())
            .await
    }

    /// Answer a question, aborting promptly once `cancel` fires
    pub async fn answer_query_with_cancel(
        &self,
        query: &str,
        documents: &[Document],
        cancel: CancellationToken,
    ) -> QueryResult {
        let started = Instant::now();
        let mut stage = QueryStage::Start;

        info!(documents = documents.len(), "Answering query");

        let result = match self.run(query, documents, &cancel, &mut stage).await {
            Ok(synthesis) => QueryResult::answered(synthesis.answer, synthesis.sources_used),
            Err(e) => {
                let kind = e.kind();
                let event = if kind == ErrorKind::Cancelled {
                    StageEvent::Cancelled
                } else {
                    StageEvent::Failed
                };
                self.advance(&mut stage, event).ok();

                match kind {
                    ErrorKind::Cancelled => info!("Query cancelled"),
                    ErrorKind::EmptyDocumentPool => warn!("Query rejected: no documents"),
                    _ => error!(kind = %kind, error = %e, "Query failed"),
                }
                QueryResult::failed(kind)
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(TelemetryEvent::QueryFinished {
                duration_ms,
                error: result.error,
                timestamp: Instant::now(),
            });
        }
        info!(
            duration_ms,
            sources = result.sources_used.len(),
            error = ?result.error,
            "Query finished"
        );

        result
    }

    async fn run(
        &self,
        query: &str,
        documents: &[Document],
        cancel: &CancellationToken,
        stage: &mut QueryStage,
    ) -> Result<Synthesis> {
        self.advance(stage, StageEvent::Begin)?;

        let pool = DocumentPool::new(documents);
        if pool.is_empty() {
            self.advance(stage, StageEvent::PoolEmpty)?;
            return Err(RagError::EmptyDocumentPool);
        }
        self.advance(stage, StageEvent::PoolValid)?;

        // Chunked once; both phases see the same set
        let chunks = pool.chunks_for(self.config.max_chunk_size);
        if chunks.is_empty() {
            // Documents present but all blank
            return Err(RagError::EmptyDocumentPool);
        }
        debug!(chunks = chunks.len(), "Documents chunked");
        self.advance(stage, StageEvent::Chunked)?;

        let relevant = self.filter.filter_relevant(&chunks, query, cancel).await?;
        debug!(relevant = relevant.len(), "Relevance filtering done");
        self.advance(stage, StageEvent::Filtered)?;

        let synthesis = self.synthesizer.synthesize(&relevant, query, cancel).await?;
        self.advance(stage, StageEvent::Synthesized)?;

        Ok(synthesis)
    }

    fn advance(&self, stage: &mut QueryStage, event: StageEvent) -> Result<()> {
        let from = *stage;
        let next = from.transition(event)?;
        debug!(from = ?from, to = ?next, "{}", next.display_name());
        *stage = next;
        Ok(())
    }
}
