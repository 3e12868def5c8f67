//! The State Table: concurrent map from document id to stored State.
//!
//! The map lock is held only to find, insert or remove entries. Each
//! document sits behind its own mutex, so updates to different ids never
//! contend and updates to the same id are serialized. Readers lock a
//! document only long enough to clone it.
//!
//! Lookups other than by id are linear scans over the whole table.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use docstore_state::keys::{
    KEY_ANCESTOR_IDS, KEY_ID, KEY_IS_PROXY, KEY_NAME, KEY_PARENT_ID, KEY_PROXY_IDS,
    KEY_PROXY_TARGET_ID,
};
use docstore_state::{apply_diff, ApplyOptions, State, StateDiff, StateValue};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::change_token::ChangeTokenUpdater;
use crate::error::{RepositoryError, Result};

pub(crate) type DocumentSlot = Arc<Mutex<State>>;

/// Second predicate operator of [`StateTable::query_key_value_with_operator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    In,
    NotIn,
}

/// Ids and proxy relations collected by [`StateTable::query_key_value_array`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubTree {
    pub ids: HashSet<String>,
    /// Proxy id to target id, for proxies among `ids`.
    pub proxy_targets: HashMap<String, String>,
    /// Target id to the ids of the proxies pointing at it.
    pub target_proxies: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
pub struct StateTable {
    states: RwLock<HashMap<String, DocumentSlot>>,
    options: ApplyOptions,
}

impl StateTable {
    pub fn new(options: ApplyOptions) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }

    pub(crate) fn slot(&self, id: &str) -> Option<DocumentSlot> {
        self.states.read().get(id).cloned()
    }

    // ── Create / read ─────────────────────────────────────────────────────

    /// Stores an independent copy of `state`, keyed by its `ecm:id`.
    pub fn create_state(&self, state: &State) -> Result<()> {
        let id = state.id().ok_or(RepositoryError::MissingId)?;
        trace!(id, "create");
        let stored = state.deep_copy()?;
        match self.states.write().entry(id.to_string()) {
            Entry::Occupied(_) => {
                trace!(id, "create: duplicate id");
                Err(RepositoryError::AlreadyExists(id.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(stored)));
                Ok(())
            }
        }
    }

    /// Creates each State in order, stopping at the first failure.
    pub fn create_states(&self, states: &[State]) -> Result<()> {
        states.iter().try_for_each(|state| self.create_state(state))
    }

    pub fn read_state(&self, id: &str) -> Option<State> {
        trace!(id, "read");
        self.slot(id).map(|slot| slot.lock().clone())
    }

    /// Reads only `keys` of the document; the id is always included.
    pub fn read_partial_state(&self, id: &str, keys: &[&str]) -> Option<State> {
        trace!(id, ?keys, "read partial");
        let slot = self.slot(id)?;
        let state = slot.lock();
        Some(state.project(std::iter::once(KEY_ID).chain(keys.iter().copied())))
    }

    /// Reads the documents that exist among `ids`, in request order.
    pub fn read_states(&self, ids: &[String]) -> Vec<State> {
        trace!(count = ids.len(), "read many");
        ids.iter().filter_map(|id| self.read_state(id)).collect()
    }

    // ── Update / delete ───────────────────────────────────────────────────

    /// Merges `diff` into the stored document.
    ///
    /// When a change-token updater is given, its conditions are checked and
    /// its updates applied in the same exclusive section as the diff. A
    /// failing diff leaves the stored State untouched.
    pub fn update_state(&self, id: &str, diff: &StateDiff, change_token: Option<&ChangeTokenUpdater>) -> Result<()> {
        let slot = self.slot(id).ok_or_else(|| {
            trace!(id, "update: missing document");
            RepositoryError::ConcurrentUpdate(id.to_string())
        })?;
        let mut state = slot.lock();
        let mut scratch = state.clone();
        if let Some(updater) = change_token {
            if let Some(key) = updater.failed_condition(&state) {
                trace!(id, key, "update: change token mismatch");
                return Err(RepositoryError::ConcurrentUpdate(id.to_string()));
            }
            updater.apply_updates(&mut scratch)?;
        }
        trace!(id, entries = diff.len(), "update");
        apply_diff(&mut scratch, diff, &self.options)?;
        *state = scratch;
        Ok(())
    }

    /// Removes the documents; ids with no document are skipped.
    pub fn delete_states<'a, I>(&self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut states = self.states.write();
        for id in ids {
            trace!(id, "delete");
            if states.remove(id).is_none() {
                debug!(id, "delete: no such document");
            }
        }
    }

    // ── Scans ─────────────────────────────────────────────────────────────

    /// Calls `visit` on every stored document under its lock.
    pub(crate) fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&State),
    {
        let states = self.states.read();
        for slot in states.values() {
            visit(&*slot.lock());
        }
    }

    /// Clones of all documents matching `predicate`, at most `limit` of them
    /// when `limit > 0`.
    fn find<P>(&self, limit: usize, mut predicate: P) -> Vec<State>
    where
        P: FnMut(&State) -> bool,
    {
        let mut found = Vec::new();
        let states = self.states.read();
        for slot in states.values() {
            if limit > 0 && found.len() >= limit {
                break;
            }
            let state = slot.lock();
            if predicate(&*state) {
                found.push(state.clone());
            }
        }
        found
    }

    fn exists<P>(&self, mut predicate: P) -> bool
    where
        P: FnMut(&State) -> bool,
    {
        let states = self.states.read();
        states.values().any(|slot| predicate(&*slot.lock()))
    }

    // ── Child lookup ──────────────────────────────────────────────────────

    pub fn read_child_state(&self, parent_id: &str, name: &str, ignored: &HashSet<String>) -> Option<State> {
        trace!(parent_id, name, "read child");
        self.find(1, |s| is_child(s, parent_id, name, ignored)).into_iter().next()
    }

    pub fn has_child(&self, parent_id: &str, name: &str, ignored: &HashSet<String>) -> bool {
        trace!(parent_id, name, "has child");
        self.exists(|s| is_child(s, parent_id, name, ignored))
    }

    // ── Key / value queries ───────────────────────────────────────────────

    /// Documents whose value at `key` equals `value`, or whose array at
    /// `key` contains it.
    pub fn query_key_value(&self, key: &str, value: &StateValue, ignored: &HashSet<String>) -> Vec<State> {
        trace!(key, value = %value_label(value), "query key/value");
        self.find(0, |s| !is_ignored(s, ignored) && matches_value(s, key, value))
    }

    pub fn query_key_value2(
        &self,
        key1: &str,
        value1: &StateValue,
        key2: &str,
        value2: &StateValue,
        ignored: &HashSet<String>,
    ) -> Vec<State> {
        trace!(key1, key2, "query key/value pair");
        self.find(0, |s| {
            !is_ignored(s, ignored) && matches_value(s, key1, value1) && matches_value(s, key2, value2)
        })
    }

    /// Equality on `key1`, then `In` / `NotIn` of `values2` on `key2`.
    pub fn query_key_value_with_operator(
        &self,
        key1: &str,
        value1: &StateValue,
        key2: &str,
        operator: QueryOperator,
        values2: &[StateValue],
        ignored: &HashSet<String>,
    ) -> Vec<State> {
        trace!(key1, key2, ?operator, "query key/value with operator");
        self.find(0, |s| {
            if is_ignored(s, ignored) || !matches_value(s, key1, value1) {
                return false;
            }
            let any = values2.iter().any(|v| matches_value(s, key2, v));
            match operator {
                QueryOperator::In => any,
                QueryOperator::NotIn => !any,
            }
        })
    }

    pub fn query_key_value_presence(&self, key: &str, value: &StateValue, ignored: &HashSet<String>) -> bool {
        trace!(key, value = %value_label(value), "query key/value presence");
        self.exists(|s| !is_ignored(s, ignored) && matches_value(s, key, value))
    }

    /// Documents having `root_id` among their ancestors, projected to their
    /// id and `keys`. `limit == 0` means unbounded.
    pub fn get_descendants(&self, root_id: &str, keys: &[&str], limit: usize) -> Vec<State> {
        trace!(root_id, ?keys, limit, "descendants");
        let root = StateValue::string(root_id);
        let mut found = Vec::new();
        self.for_each(|s| {
            if (limit == 0 || found.len() < limit) && contains_at(s, KEY_ANCESTOR_IDS, &root) {
                found.push(s.project(std::iter::once(KEY_ID).chain(keys.iter().copied())));
            }
        });
        found
    }

    /// Collects the ids of documents whose array at `key` contains `value`,
    /// with the proxy relations among them.
    pub fn query_key_value_array(&self, key: &str, value: &StateValue) -> SubTree {
        trace!(key, value = %value_label(value), "query key/value array");
        let mut tree = SubTree::default();
        self.for_each(|s| {
            if !contains_at(s, key, value) {
                return;
            }
            let Some(id) = s.id() else {
                return;
            };
            tree.ids.insert(id.to_string());
            if s.get(KEY_IS_PROXY).and_then(StateValue::as_bool) == Some(true) {
                if let Some(target) = s.get_str(KEY_PROXY_TARGET_ID) {
                    tree.proxy_targets.insert(id.to_string(), target.to_string());
                }
            }
            if let Some(proxies) = s.get(KEY_PROXY_IDS).and_then(StateValue::as_items) {
                let proxies: Vec<String> = proxies.iter().filter_map(|p| p.as_str().map(str::to_string)).collect();
                if !proxies.is_empty() {
                    tree.target_proxies.insert(id.to_string(), proxies);
                }
            }
        });
        tree
    }
}

fn is_ignored(state: &State, ignored: &HashSet<String>) -> bool {
    state.id().is_some_and(|id| ignored.contains(id))
}

fn is_child(state: &State, parent_id: &str, name: &str, ignored: &HashSet<String>) -> bool {
    state.get_str(KEY_PARENT_ID) == Some(parent_id) && state.get_str(KEY_NAME) == Some(name) && !is_ignored(state, ignored)
}

/// `value` equals the stored value at `key` or is an element of it. A
/// `Null` value matches an absent key.
pub(crate) fn matches_value(state: &State, key: &str, value: &StateValue) -> bool {
    match state.get(key) {
        None => value.is_null(),
        Some(stored) => stored == value || stored.contains_item(value),
    }
}

fn contains_at(state: &State, key: &str, value: &StateValue) -> bool {
    state.get(key).is_some_and(|stored| stored.contains_item(value))
}

fn value_label(value: &StateValue) -> String {
    docstore_state::value_to_json(value).to_string()
}
