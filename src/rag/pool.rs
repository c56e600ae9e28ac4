//! Read-only view over the documents of a single query

use std::collections::BTreeSet;

use crate::rag::chunker::TextChunker;
use crate::types::{Chunk, Document};

/// Borrowed document collection; never mutates what it is given
#[derive(Debug, Clone, Copy)]
pub struct DocumentPool<'a> {
    documents: &'a [Document],
}

impl<'a> DocumentPool<'a> {
    pub fn new(documents: &'a [Document]) -> Self {
        Self { documents }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Names of every document in the pool
    pub fn names(&self) -> BTreeSet<String> {
        self.documents.iter().map(|d| d.name.clone()).collect()
    }

    /// Chunk every document, in document order then chunk order
    pub fn chunks_for(&self, max_chunk_size: usize) -> Vec<Chunk> {
        let chunker = TextChunker::new(max_chunk_size);

        self.documents
            .iter()
            .flat_map(|document| {
                chunker
                    .split(&document.content)
                    .into_iter()
                    .map(move |content| Chunk {
                        content,
                        source_id: document.id.clone(),
                        source_name: document.name.clone(),
                    })
            })
            .collect()
    }
}
