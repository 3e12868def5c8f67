//! Diff descriptors: the sparse mutations merged into a stored State.
//!
//! A [`StateDiff`] maps keys to one of four mutation kinds ([`DiffValue`]).
//! Lists and arrays are mutated through a [`ListDiff`] which overwrites,
//! skips or recurses into existing positions and appends at the tail.

use indexmap::IndexMap;

use crate::delta::Delta;
use crate::value::StateValue;

/// One entry of a [`StateDiff`].
#[derive(Debug, Clone, PartialEq)]
pub enum DiffValue {
    /// Replace the key with this value; `Null` removes it.
    Value(StateValue),
    /// Recurse into the nested State at the key.
    Diff(StateDiff),
    /// Mutate the list or array at the key.
    List(ListDiff),
    /// Increment the number at the key.
    Delta(Delta),
}

impl From<StateValue> for DiffValue {
    fn from(v: StateValue) -> Self {
        match v {
            StateValue::Delta(d) => DiffValue::Delta(d),
            v => DiffValue::Value(v),
        }
    }
}

impl From<Delta> for DiffValue {
    fn from(d: Delta) -> Self {
        DiffValue::Delta(d)
    }
}

impl From<StateDiff> for DiffValue {
    fn from(d: StateDiff) -> Self {
        DiffValue::Diff(d)
    }
}

impl From<ListDiff> for DiffValue {
    fn from(d: ListDiff) -> Self {
        DiffValue::List(d)
    }
}

/// Sparse set of field-level mutations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiff {
    entries: IndexMap<String, DiffValue>,
}

impl StateDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&DiffValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DiffValue)> {
        self.entries.iter()
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<DiffValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    // Builder helpers, one per mutation kind.

    pub fn set(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.entries.insert(key.into(), DiffValue::Value(value.into()));
        self
    }

    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.entries.insert(key.into(), DiffValue::Value(StateValue::Null));
        self
    }

    pub fn nested(mut self, key: impl Into<String>, diff: StateDiff) -> Self {
        self.entries.insert(key.into(), DiffValue::Diff(diff));
        self
    }

    pub fn list(mut self, key: impl Into<String>, diff: ListDiff) -> Self {
        self.entries.insert(key.into(), DiffValue::List(diff));
        self
    }

    pub fn delta(mut self, key: impl Into<String>, delta: Delta) -> Self {
        self.entries.insert(key.into(), DiffValue::Delta(delta));
        self
    }
}

impl FromIterator<(String, DiffValue)> for StateDiff {
    fn from_iter<T: IntoIterator<Item = (String, DiffValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A position of a [`ListDiff`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListElementDiff {
    /// Leave the element untouched.
    Nop,
    /// Replace the element.
    Value(StateValue),
    /// Recurse into the element, which must be a State.
    Diff(StateDiff),
}

/// Ordered-list mutation: positional overwrite followed by tail append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListDiff {
    /// Whether the target is a fixed array rather than a growable list.
    pub is_array: bool,
    /// Positional mutations, index-aligned with the target.
    pub diff: Option<Vec<ListElementDiff>>,
    /// Values appended at the tail.
    pub rpush: Option<Vec<StateValue>>,
}

impl ListDiff {
    pub fn list() -> Self {
        Self::default()
    }

    pub fn array() -> Self {
        Self {
            is_array: true,
            ..Self::default()
        }
    }

    pub fn with_diff(mut self, diff: Vec<ListElementDiff>) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn with_rpush(mut self, rpush: Vec<StateValue>) -> Self {
        self.rpush = Some(rpush);
        self
    }

    /// `true` when applying this diff cannot change anything.
    pub fn is_noop(&self) -> bool {
        let diff_noop = self
            .diff
            .as_ref()
            .map(|d| d.iter().all(|e| matches!(e, ListElementDiff::Nop)))
            .unwrap_or(true);
        let rpush_noop = self.rpush.as_ref().map(Vec::is_empty).unwrap_or(true);
        diff_noop && rpush_noop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_converts_to_delta_entry() {
        let mut d = StateDiff::new();
        d.put("n", Delta::long(1, 1));
        assert!(matches!(d.get("n"), Some(DiffValue::Delta(_))));
    }

    #[test]
    fn test_builder() {
        let d = StateDiff::new()
            .set("title", "x")
            .unset("gone")
            .nested("meta", StateDiff::new().set("a", 1i64))
            .list("tags", ListDiff::array().with_rpush(vec!["t".into()]));
        assert_eq!(d.len(), 4);
        assert_eq!(d.get("gone"), Some(&DiffValue::Value(StateValue::Null)));
    }

    #[test]
    fn test_list_diff_noop() {
        assert!(ListDiff::list().is_noop());
        assert!(ListDiff::list().with_diff(vec![ListElementDiff::Nop]).is_noop());
        assert!(!ListDiff::list().with_rpush(vec![1i64.into()]).is_noop());
    }
}
