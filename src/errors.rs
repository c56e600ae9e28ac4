//! Error types for docquery
//!
//! `RagError` carries the transport-level detail; `ErrorKind` is the small,
//! stable taxonomy that callers render to users.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the query engine
#[derive(Error, Debug)]
pub enum RagError {
    /// No documents were supplied with the query
    #[error("Document pool is empty")]
    EmptyDocumentPool,

    /// A model call did not finish before its deadline
    #[error("Model request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Upstream rate limit
    #[error("Rate limited by model endpoint: {0}")]
    RateLimited(String),

    /// Upstream quota exhausted
    #[error("Model quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Caller cancelled the query
    #[error("Query cancelled")]
    Cancelled,

    /// Non-success HTTP status from the model endpoint
    #[error("Model API returned HTTP {status}: {message}")]
    ApiStatus { status: u16, message: String },

    /// Response arrived but could not be understood
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Query stage machine misuse
    #[error("Invalid stage transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Unexpected error: {0}")]
    Generic(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, RagError>;

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(err.to_string())
    }
}

impl RagError {
    /// Project this error onto the user-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::EmptyDocumentPool => ErrorKind::EmptyDocumentPool,
            RagError::Timeout { .. } => ErrorKind::Timeout,
            RagError::RateLimited(_) => ErrorKind::RateLimited,
            RagError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            RagError::Cancelled => ErrorKind::Cancelled,
            RagError::ApiStatus { status: 429, message } => {
                if mentions_quota(message) {
                    ErrorKind::QuotaExceeded
                } else {
                    ErrorKind::RateLimited
                }
            }
            _ => ErrorKind::Unexpected,
        }
    }
}

/// User-facing error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyDocumentPool,
    Timeout,
    RateLimited,
    QuotaExceeded,
    Unexpected,
    Cancelled,
}

impl ErrorKind {
    /// Stable, non-technical message shown in place of an answer
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::EmptyDocumentPool => {
                "Please upload at least one document before asking a question."
            }
            ErrorKind::Timeout => {
                "The request took too long to complete. Please try again in a moment."
            }
            ErrorKind::RateLimited => "We're being rate limited, please wait and try again.",
            ErrorKind::QuotaExceeded => {
                "The AI service quota has been exceeded. Please try again later."
            }
            ErrorKind::Unexpected => {
                "Something went wrong while answering your question. Please try again."
            }
            ErrorKind::Cancelled => "The request was cancelled.",
        }
    }

    /// Short machine-friendly name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::EmptyDocumentPool => "empty_document_pool",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::Unexpected => "unexpected",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased alphanumeric words of a message
fn words(message: &str) -> impl Iterator<Item = String> + '_ {
    message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Whether a message talks about quota ("quota", "quotas", "RESOURCE_EXHAUSTED")
pub(crate) fn mentions_quota(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("resource_exhausted") || words(message).any(|w| w.starts_with("quota"))
}

/// Whether a message talks about rate limiting
///
/// Matches whole words so that "generate" or "accurate" do not count.
pub(crate) fn mentions_rate_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("too many requests")
        || words(message).any(|w| w == "rate" || w == "ratelimit" || w == "ratelimited")
}
