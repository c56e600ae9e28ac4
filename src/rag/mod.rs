// Retrieval-augmented query engine
//
// Components:
// - Chunker: sentence-aligned splitting of document text
// - Pool: read-only document view producing tagged chunks
// - Filter: batched relevant / not-relevant screening by the model
// - Synthesis: single citation-aware answer call
// - Pipeline: end-to-end orchestration and error folding

pub mod chunker;
pub mod filter;
pub mod pipeline;
pub mod pool;
pub mod prompts;
pub mod state;
pub mod synthesis;

// Re-export key types
pub use chunker::{split_sentences, TextChunker, DEFAULT_MAX_CHUNK_SIZE};
pub use filter::{parse_verdicts, RelevanceFilter, DEFAULT_BATCH_SIZE, DEFAULT_INTER_BATCH_DELAY};
pub use pipeline::{RagConfig, RagQueryOrchestrator};
pub use pool::DocumentPool;
pub use prompts::PromptTemplates;
pub use state::{QueryStage, StageEvent};
pub use synthesis::{AnswerSynthesizer, Synthesis};
