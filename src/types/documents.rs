//! Document, chunk and query result types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::ErrorKind;

/// A caller-supplied document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique identifier
    pub id: String,
    /// Display name, used for citations
    pub name: String,
    /// Full text content
    pub content: String,
    /// MIME type reported by the uploader
    pub media_type: String,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            media_type: media_type.into(),
        }
    }

    /// Plain-text document with a generated id
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            name,
            content,
            "text/plain",
        )
    }
}

/// A sentence-aligned fragment of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub content: String,
    pub source_id: String,
    pub source_name: String,
}

/// Model verdict for one chunk of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceVerdict {
    pub chunk_index_in_batch: usize,
    pub relevant: bool,
}

/// Outcome of a query, returned to callers in every case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub answer: String,
    pub sources_used: BTreeSet<String>,
    pub error: Option<ErrorKind>,
}

impl QueryResult {
    /// Successful answer
    pub fn answered(answer: String, sources_used: BTreeSet<String>) -> Self {
        Self {
            answer,
            sources_used,
            error: None,
        }
    }

    /// Failure with the kind's placeholder message as the answer
    pub fn failed(kind: ErrorKind) -> Self {
        let answer = match kind {
            ErrorKind::EmptyDocumentPool => String::new(),
            _ => kind.user_message().to_string(),
        };
        Self {
            answer,
            sources_used: BTreeSet::new(),
            error: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
