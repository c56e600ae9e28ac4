//! Reading documents from disk for the CLI

use std::path::Path;

use crate::errors::{RagError, Result};
use crate::types::Document;

/// Guess a MIME type from the file extension
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("md") | Some("markdown") => "text/markdown",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("html") | Some("htm") => "text/html",
        _ => "text/plain",
    }
}

/// Load one UTF-8 file as a document named after its file name
pub fn load_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RagError::Generic(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(Document::new(
        uuid::Uuid::new_v4().to_string(),
        name,
        content,
        media_type_for(path),
    ))
}
