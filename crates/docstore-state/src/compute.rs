//! Diff computation: the [`StateDiff`] that turns one State into another.
//!
//! This is what a transient session submits on save. Applying the result of
//! [`diff_states`] onto `old` yields a State equal to `new`.

use crate::diff::{DiffValue, ListDiff, ListElementDiff, StateDiff};
use crate::state::State;
use crate::value::StateValue;

/// Computes the diff from `old` to `new`. Empty when they are equal.
pub fn diff_states(old: &State, new: &State) -> StateDiff {
    let mut diff = StateDiff::new();
    for (key, _) in old.iter() {
        if !new.contains_key(key) {
            diff.put(key.as_str(), DiffValue::Value(StateValue::Null));
        }
    }
    for (key, new_value) in new.iter() {
        match old.get(key) {
            None => {
                diff.put(key.as_str(), replacement(new_value));
            }
            Some(old_value) => {
                if let Some(entry) = diff_values(old_value, new_value) {
                    diff.put(key.as_str(), entry);
                }
            }
        }
    }
    diff
}

fn diff_values(old: &StateValue, new: &StateValue) -> Option<DiffValue> {
    if old == new {
        return None;
    }
    let entry = match (old, new) {
        (StateValue::State(o), StateValue::State(n)) => DiffValue::Diff(diff_states(o, n)),
        (StateValue::Array(o), StateValue::Array(n)) => diff_items(o, n, true, new),
        (StateValue::List(o), StateValue::List(n)) => diff_items(o, n, false, new),
        _ => replacement(new),
    };
    Some(entry)
}

/// Pending deltas travel as increments, everything else as a clone. The
/// applier deep-copies values when it installs them.
fn replacement(value: &StateValue) -> DiffValue {
    match value {
        StateValue::Delta(d) => DiffValue::Delta(*d),
        v => DiffValue::Value(v.clone()),
    }
}

/// Growing or same-size lists become a positional diff plus a tail append;
/// shrinking or emptied lists are replaced wholesale.
fn diff_items(old: &[StateValue], new: &[StateValue], is_array: bool, whole: &StateValue) -> DiffValue {
    if new.is_empty() || new.len() < old.len() {
        return DiffValue::Value(whole.clone());
    }
    let positions: Vec<ListElementDiff> = old
        .iter()
        .zip(new)
        .map(|(o, n)| match (o, n) {
            _ if o == n => ListElementDiff::Nop,
            (StateValue::State(os), StateValue::State(ns)) => ListElementDiff::Diff(diff_states(os, ns)),
            _ => ListElementDiff::Value(n.clone()),
        })
        .collect();
    let tail: Vec<StateValue> = new[old.len()..].to_vec();

    let mut list_diff = if is_array { ListDiff::array() } else { ListDiff::list() };
    if positions.iter().any(|p| !matches!(p, ListElementDiff::Nop)) {
        list_diff.diff = Some(positions);
    }
    if !tail.is_empty() {
        list_diff.rpush = Some(tail);
    }
    DiffValue::List(list_diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::{apply_diff, ApplyOptions};

    fn roundtrip(old: &State, new: &State) {
        let diff = diff_states(old, new);
        let mut applied = old.clone();
        apply_diff(&mut applied, &diff, &ApplyOptions::strict()).unwrap();
        assert_eq!(&applied, new, "diff = {diff:?}");
    }

    #[test]
    fn test_equal_states_produce_empty_diff() {
        let s = State::new().with("a", 1i64);
        assert!(diff_states(&s, &s.clone()).is_empty());
    }

    #[test]
    fn test_removed_and_added_keys() {
        let old = State::new().with("a", 1i64).with("b", 2i64);
        let new = State::new().with("b", 2i64).with("c", 3i64);
        let diff = diff_states(&old, &new);
        assert_eq!(diff.get("a"), Some(&DiffValue::Value(StateValue::Null)));
        assert_eq!(diff.get("c"), Some(&DiffValue::Value(StateValue::long(3))));
        assert!(diff.get("b").is_none());
        roundtrip(&old, &new);
    }

    #[test]
    fn test_appended_array_uses_rpush() {
        let old = State::new().with("tags", StateValue::string_array(["a", "b"]));
        let new = State::new().with("tags", StateValue::string_array(["a", "b", "c"]));
        let diff = diff_states(&old, &new);
        assert_eq!(
            diff.get("tags"),
            Some(&DiffValue::List(ListDiff::array().with_rpush(vec!["c".into()])))
        );
        roundtrip(&old, &new);
    }

    #[test]
    fn test_list_element_nested_diff() {
        let old = State::new().with(
            "files",
            StateValue::List(vec![
                State::new().with("name", "a").into(),
                State::new().with("name", "b").into(),
            ]),
        );
        let new = State::new().with(
            "files",
            StateValue::List(vec![
                State::new().with("name", "a").into(),
                State::new().with("name", "B").into(),
            ]),
        );
        let diff = diff_states(&old, &new);
        match diff.get("files") {
            Some(DiffValue::List(ld)) => {
                let positions = ld.diff.as_ref().unwrap();
                assert_eq!(positions[0], ListElementDiff::Nop);
                assert!(matches!(positions[1], ListElementDiff::Diff(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
        roundtrip(&old, &new);
    }

    #[test]
    fn test_shrunk_list_is_replaced() {
        let old = State::new().with("l", StateValue::List(vec![1i64.into(), 2i64.into()]));
        let new = State::new().with("l", StateValue::List(vec![1i64.into()]));
        assert!(matches!(diff_states(&old, &new).get("l"), Some(DiffValue::Value(_))));
        roundtrip(&old, &new);
    }

    #[test]
    fn test_pending_delta_becomes_increment() {
        let old = State::new().with("views", 10i64);
        let new = State::new().with("views", crate::delta::Delta::long(10, 2));
        let diff = diff_states(&old, &new);
        assert_eq!(diff.get("views"), Some(&DiffValue::Delta(crate::delta::Delta::long(10, 2))));
    }

    #[test]
    fn test_nested_state_change() {
        let old = State::new().with("m", State::new().with("x", 1i64).with("y", 1i64));
        let new = State::new().with("m", State::new().with("x", 2i64).with("y", 1i64));
        let diff = diff_states(&old, &new);
        assert_eq!(diff.get("m"), Some(&DiffValue::Diff(StateDiff::new().set("x", 2i64))));
        roundtrip(&old, &new);
    }
}
