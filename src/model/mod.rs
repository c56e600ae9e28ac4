//! Model access module
//!
//! Provides the `GenerativeModel` endpoint abstraction, the HTTP client for
//! it, and the retrying wrapper every engine call goes through.

pub mod client;
pub mod resilient;

#[cfg(test)]
pub(crate) mod fake;

// Re-export commonly used types
pub use client::{GeminiClient, GenerativeModel, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use resilient::{
    classify_transient, ResilientModelClient, RetryPolicy, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUEST_TIMEOUT,
};
