//! docquery - Resilient document question answering
//!
//! Answers a natural-language question against a pool of documents using a
//! generative model: documents are split into sentence-aligned chunks, a
//! batched relevance pass keeps the chunks that matter, and one synthesis
//! call produces a cited answer.
//!
//! # Architecture
//!
//! - **model**: endpoint abstraction, HTTP client, retry/deadline wrapper
//! - **rag**: chunking, relevance filtering, synthesis, orchestration
//! - **telemetry**: in-process event counters
//! - **cli / config / logging**: the binary's surface

pub mod errors;
pub mod types;

pub mod model;
pub mod rag;
pub mod telemetry;

pub mod cli;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use errors::{ErrorKind, RagError, Result};
pub use model::{GeminiClient, GenerativeModel, ResilientModelClient, RetryPolicy};
pub use rag::{RagConfig, RagQueryOrchestrator};
pub use types::{Chunk, Document, QueryResult};
