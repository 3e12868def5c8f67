//! Scroll over query results.
//!
//! The in-memory store has no server-side cursor: the first call returns
//! every matching id in a single batch tagged [`NO_SCROLL_ID`], and
//! continuing that scroll returns an empty batch.

use tracing::debug;

use crate::error::{RepositoryError, Result};
use crate::query::ExpressionEvaluator;
use crate::table::StateTable;

/// Scroll id of a result that has no further batches.
pub const NO_SCROLL_ID: &str = "noscroll";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollResult {
    pub scroll_id: String,
    pub results: Vec<String>,
}

impl ScrollResult {
    pub fn empty(scroll_id: impl Into<String>) -> Self {
        Self {
            scroll_id: scroll_id.into(),
            results: Vec::new(),
        }
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

/// Starts a scroll: the ids of all documents `evaluator` matches.
///
/// `batch_size` and `keep_alive_seconds` are accepted for interface
/// parity and do not affect the result.
pub fn scroll(
    table: &StateTable,
    evaluator: &dyn ExpressionEvaluator,
    batch_size: usize,
    keep_alive_seconds: u64,
) -> ScrollResult {
    let mut results = Vec::new();
    table.for_each(|state| {
        if evaluator.matches(state).is_empty() {
            return;
        }
        if let Some(id) = state.id() {
            results.push(id.to_string());
        }
    });
    debug!(batch_size, keep_alive_seconds, count = results.len(), "scroll: single batch");
    ScrollResult {
        scroll_id: NO_SCROLL_ID.to_string(),
        results,
    }
}

/// Continues a scroll. Only [`NO_SCROLL_ID`] is known, and it is exhausted.
pub fn scroll_next(scroll_id: &str) -> Result<ScrollResult> {
    if scroll_id == NO_SCROLL_ID {
        Ok(ScrollResult::empty(NO_SCROLL_ID))
    } else {
        Err(RepositoryError::UnknownScroll(scroll_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_next() {
        let next = scroll_next(NO_SCROLL_ID).unwrap();
        assert!(!next.has_results());
        assert_eq!(next.scroll_id, NO_SCROLL_ID);
        assert_eq!(
            scroll_next("abc"),
            Err(RepositoryError::UnknownScroll("abc".into()))
        );
    }
}
