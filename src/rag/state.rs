//! Query stage machine
//!
//! Linear progression with a single early exit:
//!
//! ```text
//! Start -> ValidatePool -> Chunk -> Filter -> Synthesize -> Done
//!               |                                         ^
//!               +------------- (empty pool) --------------+
//! ```
//!
//! `Failed` and `Cancelled` also jump straight to `Done`. Nothing loops back.

use serde::{Deserialize, Serialize};

use crate::errors::{RagError, Result};

/// Stages of one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryStage {
    Start,
    ValidatePool,
    Chunk,
    Filter,
    Synthesize,
    /// Terminal
    Done,
}

/// Events that move a query forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    Begin,
    PoolValid,
    PoolEmpty,
    Chunked,
    Filtered,
    Synthesized,
    Failed,
    Cancelled,
}

impl QueryStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryStage::Done)
    }

    /// Attempt a transition
    pub fn transition(&self, event: StageEvent) -> Result<QueryStage> {
        use QueryStage::*;
        use StageEvent::*;

        let next = match (self, event) {
            (Done, _) => Done,
            (_, Failed) | (_, Cancelled) => Done,

            (Start, Begin) => ValidatePool,
            (ValidatePool, PoolValid) => Chunk,
            (ValidatePool, PoolEmpty) => Done,
            (Chunk, Chunked) => Filter,
            (Filter, Filtered) => Synthesize,
            (Synthesize, Synthesized) => Done,

            (from, event) => {
                return Err(RagError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }

    /// Human-readable stage name
    pub fn display_name(&self) -> &'static str {
        match self {
            QueryStage::Start => "Starting",
            QueryStage::ValidatePool => "Checking documents",
            QueryStage::Chunk => "Splitting documents",
            QueryStage::Filter => "Finding relevant sections",
            QueryStage::Synthesize => "Writing answer",
            QueryStage::Done => "Done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut stage = QueryStage::Start;
        for event in [
            StageEvent::Begin,
            StageEvent::PoolValid,
            StageEvent::Chunked,
            StageEvent::Filtered,
            StageEvent::Synthesized,
        ] {
            stage = stage.transition(event).unwrap();
        }
        assert_eq!(stage, QueryStage::Done);
    }

    #[test]
    fn test_empty_pool_exits_early() {
        let stage = QueryStage::ValidatePool
            .transition(StageEvent::PoolEmpty)
            .unwrap();
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_failure_and_cancel_from_any_stage() {
        for stage in [
            QueryStage::Start,
            QueryStage::ValidatePool,
            QueryStage::Chunk,
            QueryStage::Filter,
            QueryStage::Synthesize,
        ] {
            assert_eq!(stage.transition(StageEvent::Failed).unwrap(), QueryStage::Done);
            assert_eq!(stage.transition(StageEvent::Cancelled).unwrap(), QueryStage::Done);
        }
    }

    #[test]
    fn test_no_skipping_or_looping() {
        assert!(QueryStage::Start.transition(StageEvent::Filtered).is_err());
        assert!(QueryStage::Chunk.transition(StageEvent::PoolValid).is_err());
        assert!(QueryStage::Synthesize.transition(StageEvent::Chunked).is_err());
    }

    #[test]
    fn test_done_is_absorbing() {
        assert_eq!(
            QueryStage::Done.transition(StageEvent::Begin).unwrap(),
            QueryStage::Done
        );
    }
}
