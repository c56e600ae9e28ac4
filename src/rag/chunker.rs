//! Sentence-aligned text chunking
//!
//! Sentences end at `.`, `!` or `?` followed by whitespace. Sentences are
//! packed greedily into chunks of at most `max_chunk_size` characters; a
//! single sentence longer than that is emitted whole rather than cut.

use serde::{Deserialize, Serialize};

/// Default chunk size in characters
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;

/// Split text into trimmed, non-empty sentences in document order
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(next_idx, next)) = chars.peek() {
            if next.is_whitespace() {
                let sentence = text[start..next_idx].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = next_idx;
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// Greedy sentence packer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunker {
    max_chunk_size: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_SIZE)
    }
}

impl TextChunker {
    /// Create a chunker; sizes below 1 are treated as 1
    pub fn new(max_chunk_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Split `text` into chunks; sentences inside a chunk are joined by one space
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_len = 0usize;

        for sentence in split_sentences(text) {
            let len = sentence.chars().count();

            if buffer_len > 0 && buffer_len + 1 + len > self.max_chunk_size {
                chunks.push(std::mem::take(&mut buffer));
                buffer_len = 0;
            }

            if buffer_len > 0 {
                buffer.push(' ');
                buffer_len += 1;
            }
            buffer.push_str(sentence);
            buffer_len += len;
        }

        if !buffer.is_empty() {
            chunks.push(buffer);
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let chunker = TextChunker::default();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   \n\t ").is_empty());
    }

    #[test]
    fn test_no_terminators_single_chunk() {
        let chunker = TextChunker::new(10);
        let chunks = chunker.split("no sentence terminators anywhere in this text");
        assert_eq!(chunks, vec!["no sentence terminators anywhere in this text"]);
    }

    #[test]
    fn test_short_document_single_chunk() {
        let chunks = TextChunker::default().split("Cats are mammals. Dogs are mammals too.");
        assert_eq!(chunks, vec!["Cats are mammals. Dogs are mammals too."]);
    }

    #[test]
    fn test_split_sentences_terminators() {
        let sentences = split_sentences("Is it? Yes!  It is.\nPi is 3.14 today. e.g.done");
        assert_eq!(
            sentences,
            vec!["Is it?", "Yes!", "It is.", "Pi is 3.14 today.", "e.g.done"]
        );
    }

    #[test]
    fn test_consecutive_terminators_stay_together() {
        let sentences = split_sentences("Really?! Yes... ok.");
        assert_eq!(sentences, vec!["Really?!", "Yes...", "ok."]);
    }

    #[test]
    fn test_flush_when_next_sentence_overflows() {
        // "aaaa." (5) + " " + "bbbb." (5) = 11 > 10
        let chunks = TextChunker::new(10).split("aaaa. bbbb. cc.");
        assert_eq!(chunks, vec!["aaaa.", "bbbb. cc."]);
    }

    #[test]
    fn test_exact_fit_is_not_flushed() {
        // "aaaa. bbbb." is exactly 11
        let chunks = TextChunker::new(11).split("aaaa. bbbb. c.");
        assert_eq!(chunks, vec!["aaaa. bbbb.", "c."]);
    }

    #[test]
    fn test_oversized_sentence_emitted_whole() {
        let long = format!("{}.", "x".repeat(50));
        let text = format!("Short one. {} Tail.", long);
        let chunks = TextChunker::new(20).split(&text);

        assert_eq!(chunks, vec!["Short one.".to_string(), long, "Tail.".to_string()]);
    }

    #[test]
    fn test_chunk_size_bound() {
        let text: String = (0..200)
            .map(|i| format!("Sentence number {} has some words in it. ", i))
            .collect();
        let chunker = TextChunker::new(120);

        let chunks = chunker.split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(!chunk.is_empty());
            assert!(chunk.chars().count() <= 120, "chunk too long: {}", chunk);
        }
    }

    #[test]
    fn test_order_preserved_and_nothing_dropped() {
        let text = "First point. Second point!\n\nThird point? Fourth point. Trailing words";
        let chunks = TextChunker::new(30).split(text);

        let rejoined = chunks.join(" ");
        let original = split_sentences(text).join(" ");
        assert_eq!(rejoined, original);
        assert!(rejoined.ends_with("Trailing words"));
    }

    #[test]
    fn test_sizes_count_characters_not_bytes() {
        // each sentence is 6 characters but 11+ bytes
        let text = "ñññññ. ééééé.";
        let chunks = TextChunker::new(13).split(text);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let chunker = TextChunker::new(0);
        assert_eq!(chunker.max_chunk_size(), 1);
        assert_eq!(chunker.split("A. B.").len(), 2);
    }
}
