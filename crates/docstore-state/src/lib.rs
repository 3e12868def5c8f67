//! Document state model for the in-memory document store.
//!
//! A [`State`] is a nested key/value document. It is mutated through sparse
//! diffs: a [`StateDiff`] maps keys to replacements, nested diffs, list
//! diffs ([`ListDiff`]) or numeric increments ([`Delta`]).
//!
//! # Example
//!
//! ```
//! use docstore_state::{apply_diff, ApplyOptions, Delta, ListDiff, State, StateDiff, StateValue};
//!
//! let mut doc = State::new()
//!     .with("views", 10i64)
//!     .with("tags", StateValue::string_array(["a", "b"]));
//!
//! let diff = StateDiff::new()
//!     .delta("views", Delta::long(10, 3))
//!     .list("tags", ListDiff::array().with_rpush(vec!["c".into()]));
//! apply_diff(&mut doc, &diff, &ApplyOptions::default()).unwrap();
//!
//! assert_eq!(doc.get("views"), Some(&StateValue::long(13)));
//! assert_eq!(doc.get("tags"), Some(&StateValue::string_array(["a", "b", "c"])));
//! ```

pub mod apply;
pub mod compute;
pub mod delta;
pub mod diff;
pub mod error;
pub mod json;
pub mod keys;
pub mod state;
pub mod value;

pub use apply::{apply_diff, apply_diff_atomic, apply_diffs_atomic, ApplyOptions};
pub use compute::diff_states;
pub use delta::Delta;
pub use diff::{DiffValue, ListDiff, ListElementDiff, StateDiff};
pub use error::StateError;
pub use json::{from_json, to_json, value_from_json, value_to_json};
pub use state::State;
pub use value::{Scalar, StateValue};
