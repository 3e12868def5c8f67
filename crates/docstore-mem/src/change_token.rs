//! Optimistic-concurrency preconditions for updates.

use docstore_state::keys::{KEY_CHANGE_TOKEN, KEY_SYS_CHANGE_TOKEN};
use docstore_state::{State, StateError, StateValue};

use crate::error::Result;

/// Conditions checked and updates applied atomically with a diff.
///
/// A condition holds when the stored value equals the expected one; a
/// `Null` expectation holds when the key is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeTokenUpdater {
    conditions: Vec<(String, StateValue)>,
    updates: Vec<(String, StateValue)>,
}

impl ChangeTokenUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the updater for a save of `state`: the system change token
    /// must still be the one that was read, and is bumped. The user change
    /// token is bumped too when `user_change` is set.
    ///
    /// Fails with `NumericOverflow` when a token is already `i64::MAX`.
    pub fn for_save(state: &State, user_change: bool) -> Result<Self> {
        let sys = state.get(KEY_SYS_CHANGE_TOKEN).and_then(StateValue::as_long);
        let mut updater = Self::new()
            .condition(KEY_SYS_CHANGE_TOKEN, sys)
            .update(KEY_SYS_CHANGE_TOKEN, next_token(KEY_SYS_CHANGE_TOKEN, sys)?);
        if user_change {
            let token = state.get(KEY_CHANGE_TOKEN).and_then(StateValue::as_long);
            updater = updater.update(KEY_CHANGE_TOKEN, next_token(KEY_CHANGE_TOKEN, token)?);
        }
        Ok(updater)
    }

    pub fn condition(mut self, key: impl Into<String>, expected: impl Into<StateValue>) -> Self {
        self.conditions.push((key.into(), expected.into()));
        self
    }

    pub fn update(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.updates.push((key.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, StateValue)] {
        &self.conditions
    }

    pub fn updates(&self) -> &[(String, StateValue)] {
        &self.updates
    }

    /// First condition that `state` violates, if any.
    pub fn failed_condition(&self, state: &State) -> Option<&str> {
        self.conditions
            .iter()
            .find(|(key, expected)| match (state.get(key), expected) {
                (None, StateValue::Null) => false,
                (None, _) => true,
                (Some(actual), expected) => actual != expected,
            })
            .map(|(key, _)| key.as_str())
    }

    pub fn apply_updates(&self, state: &mut State) -> Result<()> {
        for (key, value) in &self.updates {
            state.put(key.as_str(), value.deep_copy()?);
        }
        Ok(())
    }
}

fn next_token(key: &str, current: Option<i64>) -> Result<i64> {
    let current = current.unwrap_or(0);
    current
        .checked_add(1)
        .ok_or_else(|| StateError::NumericOverflow(format!("{key} = {current} + 1")).into())
}
