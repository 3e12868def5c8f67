//! Diff application.
//!
//! [`apply_diff`] merges a [`StateDiff`] into a State in place, recursing
//! through nested diffs and list diffs. [`apply_diff_atomic`] runs the same
//! algorithm on a scratch copy and only swaps it in when every entry applied,
//! so a diff that does not match the shape of the State leaves it untouched.
//!
//! Every value written into the State is a deep copy of the diff's value;
//! the diff itself is never consumed or aliased.

use tracing::warn;

use crate::delta::Delta;
use crate::diff::{DiffValue, ListDiff, ListElementDiff, StateDiff};
use crate::error::StateError;
use crate::state::State;
use crate::value::StateValue;

/// Options for diff application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Fail when a ListDiff has more positions than the target list instead
    /// of logging and truncating.
    pub strict_list_diff: bool,
}

impl ApplyOptions {
    pub fn strict() -> Self {
        Self {
            strict_list_diff: true,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────

/// Applies `diff` onto `state` in place.
///
/// On error the State may be partially mutated; use [`apply_diff_atomic`]
/// when it is shared.
pub fn apply_diff(state: &mut State, diff: &StateDiff, options: &ApplyOptions) -> Result<(), StateError> {
    for (key, value) in diff.iter() {
        match value {
            DiffValue::Value(v) => {
                state.put(key.as_str(), v.deep_copy()?);
            }
            DiffValue::Diff(nested) => apply_nested(state, key, nested, options)?,
            DiffValue::List(list_diff) => apply_list_diff(state, key, list_diff, options)?,
            DiffValue::Delta(delta) => apply_delta(state, key, delta)?,
        }
    }
    Ok(())
}

/// Applies `diff` onto a copy of `state` and replaces `state` only on
/// success.
pub fn apply_diff_atomic(state: &mut State, diff: &StateDiff, options: &ApplyOptions) -> Result<(), StateError> {
    let mut scratch = state.clone();
    apply_diff(&mut scratch, diff, options)?;
    *state = scratch;
    Ok(())
}

/// Applies a sequence of diffs atomically: either all of them or none.
pub fn apply_diffs_atomic(state: &mut State, diffs: &[StateDiff], options: &ApplyOptions) -> Result<(), StateError> {
    let mut scratch = state.clone();
    for diff in diffs {
        apply_diff(&mut scratch, diff, options)?;
    }
    *state = scratch;
    Ok(())
}

// ── Per-kind applicators ──────────────────────────────────────────────────

fn apply_nested(state: &mut State, key: &str, nested: &StateDiff, options: &ApplyOptions) -> Result<(), StateError> {
    let slot = state.slot_or_insert_with(key, || StateValue::State(State::new()));
    if slot.is_null() {
        *slot = StateValue::State(State::new());
    }
    match slot {
        StateValue::State(child) => apply_diff(child, nested, options),
        other => Err(StateError::unsupported(format!(
            "cannot apply StateDiff on non-State {} at key {key}",
            other.type_name()
        ))),
    }
}

fn apply_list_diff(state: &mut State, key: &str, list_diff: &ListDiff, options: &ApplyOptions) -> Result<(), StateError> {
    let is_array = list_diff.is_array;
    let slot = state.slot_or_insert_with(key, || empty_items(is_array));
    if slot.is_null() {
        *slot = empty_items(is_array);
    }
    let items = match &mut *slot {
        StateValue::Array(items) => items,
        StateValue::List(items) if !is_array => items,
        StateValue::List(_) => {
            return Err(StateError::unsupported(format!(
                "cannot apply array ListDiff on list at key {key}"
            )))
        }
        other => {
            return Err(StateError::unsupported(format!(
                "cannot apply ListDiff on non-list {} at key {key}",
                other.type_name()
            )))
        }
    };

    if let Some(positions) = &list_diff.diff {
        apply_positions(items, key, positions, options)?;
    }
    if let Some(rpush) = &list_diff.rpush {
        for value in rpush {
            items.push(value.deep_copy()?);
        }
    }

    if items.is_empty() {
        // an emptied list is stored as an absent key
        state.remove(key);
    } else if !is_array && matches!(slot, StateValue::Array(_)) {
        if let StateValue::Array(items) = std::mem::take(slot) {
            *slot = StateValue::List(items);
        }
    }
    Ok(())
}

fn apply_positions(
    items: &mut [StateValue],
    key: &str,
    positions: &[ListElementDiff],
    options: &ApplyOptions,
) -> Result<(), StateError> {
    let len = items.len();
    if positions.len() > len {
        if options.strict_list_diff {
            return Err(StateError::ListDiffOutOfBounds {
                key: key.to_string(),
                len,
                diff_len: positions.len(),
            });
        }
        warn!(key, len, diff_len = positions.len(), "ListDiff longer than target list, truncating");
    }
    for (item, position) in items.iter_mut().zip(positions) {
        match position {
            ListElementDiff::Nop => {}
            ListElementDiff::Value(v) => *item = v.deep_copy()?,
            ListElementDiff::Diff(nested) => match item {
                StateValue::State(element) => apply_diff(element, nested, options)?,
                other => {
                    return Err(StateError::unsupported(format!(
                        "cannot apply StateDiff on non-State {} in list at key {key}",
                        other.type_name()
                    )))
                }
            },
        }
    }
    Ok(())
}

fn apply_delta(state: &mut State, key: &str, delta: &Delta) -> Result<(), StateError> {
    let next = match state.get(key) {
        None | Some(StateValue::Null) => delta.full_value()?,
        Some(StateValue::Scalar(current)) => delta.apply_to(current)?,
        Some(StateValue::Delta(pending)) => delta.apply_to(&pending.full_value()?)?,
        Some(other) => {
            return Err(StateError::unsupported(format!(
                "cannot apply Delta on {} at key {key}",
                other.type_name()
            )))
        }
    };
    state.put(key, StateValue::Scalar(next));
    Ok(())
}

fn empty_items(is_array: bool) -> StateValue {
    if is_array {
        StateValue::Array(Vec::new())
    } else {
        StateValue::List(Vec::new())
    }
}
