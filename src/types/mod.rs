//! Type definitions module
//!
//! Core data model shared by the chunking, filtering and synthesis stages.

pub mod documents;
pub mod messages;

// Re-export commonly used types
pub use documents::{Chunk, Document, QueryResult, RelevanceVerdict};
pub use messages::{GenerationConfig, Message, ModelRequest, ModelResponse, Role};
