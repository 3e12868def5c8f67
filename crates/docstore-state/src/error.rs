use thiserror::Error;

/// Errors raised while applying diffs to, or decoding, a [`State`](crate::State).
///
/// All of these are contract violations: the diff (or input) does not match
/// the shape of the state it targets. They are never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("ListDiff for key {key} has {diff_len} positions but the list has {len} elements")]
    ListDiffOutOfBounds {
        key: String,
        len: usize,
        diff_len: usize,
    },
    #[error("numeric overflow: {0}")]
    NumericOverflow(String),
    #[error("invalid JSON state: {0}")]
    InvalidJson(String),
}

impl StateError {
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        StateError::UnsupportedOperation(msg.into())
    }
}
