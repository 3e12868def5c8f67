//! The document state container.

use std::fmt;

use indexmap::IndexMap;

use crate::error::StateError;
use crate::keys::KEY_ID;
use crate::value::StateValue;

/// A nested key/value document.
///
/// Keys iterate in insertion order so diagnostics and tests are
/// deterministic; equality ignores order. Null values are never stored:
/// putting [`StateValue::Null`] removes the key, so an absent key and a null
/// key read the same.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    map: IndexMap<String, StateValue>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`State::put`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.put(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.map.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut StateValue> {
        self.map.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Sets `key` to `value` and returns the previous value.
    ///
    /// A null value removes the key.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Option<StateValue> {
        let key = key.into();
        match value.into() {
            StateValue::Null => self.map.shift_remove(&key),
            value => self.map.insert(key, value),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<StateValue> {
        self.map.shift_remove(key)
    }

    /// Mutable slot for `key`, inserting `default()` when absent.
    pub fn slot_or_insert_with<F>(&mut self, key: &str, default: F) -> &mut StateValue
    where
        F: FnOnce() -> StateValue,
    {
        self.map.entry(key.to_string()).or_insert_with(default)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StateValue)> {
        self.map.iter()
    }

    /// The document id, when this State is a document record.
    pub fn id(&self) -> Option<&str> {
        self.get(KEY_ID).and_then(StateValue::as_str)
    }

    /// String value at `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StateValue::as_str)
    }

    /// Independent copy with pending deltas resolved to their full values.
    pub fn deep_copy(&self) -> Result<State, StateError> {
        let mut map = IndexMap::with_capacity(self.map.len());
        for (k, v) in &self.map {
            let v = v.deep_copy()?;
            if !v.is_null() {
                map.insert(k.clone(), v);
            }
        }
        Ok(State { map })
    }

    /// Shallow projection holding only the requested keys that are present.
    pub fn project<'a, I>(&self, keys: I) -> State
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut projected = State::new();
        for key in keys {
            if let Some(value) = self.map.get(key) {
                projected.map.insert(key.to_string(), value.clone());
            }
        }
        projected
    }
}

impl FromIterator<(String, StateValue)> for State {
    fn from_iter<T: IntoIterator<Item = (String, StateValue)>>(iter: T) -> Self {
        let mut state = State::new();
        for (k, v) in iter {
            state.put(k, v);
        }
        state
    }
}

impl IntoIterator for State {
    type Item = (String, StateValue);
    type IntoIter = indexmap::map::IntoIter<String, StateValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

impl<'a> IntoIterator for &'a State {
    type Item = (&'a String, &'a StateValue);
    type IntoIter = indexmap::map::Iter<'a, String, StateValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::json::to_json(self))
    }
}
