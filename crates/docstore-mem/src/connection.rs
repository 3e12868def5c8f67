//! Connection façade over the repository.
//!
//! The store is not transactional: every operation takes effect
//! immediately and `begin` / `commit` / `rollback` do nothing.

use std::collections::HashSet;
use std::sync::Arc;

use docstore_state::{State, StateDiff, StateValue};
use tracing::trace;

use crate::change_token::ChangeTokenUpdater;
use crate::error::Result;
use crate::lock::{Lock, LockManager};
use crate::query::{self, CountUpTo, ExpressionEvaluator, OrderByClause, Page, PartialList, Projection};
use crate::repository::RepositoryInner;
use crate::scroll::{self, ScrollResult};
use crate::table::{QueryOperator, SubTree};

#[derive(Debug, Clone)]
pub struct Connection {
    repo: Arc<RepositoryInner>,
}

impl Connection {
    pub(crate) fn new(repo: Arc<RepositoryInner>) -> Self {
        Self { repo }
    }

    pub fn begin(&self) {
        trace!(repository = %self.repo.config.name, "begin");
    }

    pub fn commit(&self) {
        trace!(repository = %self.repo.config.name, "commit");
    }

    pub fn rollback(&self) {
        trace!(repository = %self.repo.config.name, "rollback");
    }

    pub fn generate_new_id(&self) -> String {
        self.repo.ids.next_id()
    }

    // ── Documents ─────────────────────────────────────────────────────────

    pub fn create_state(&self, state: &State) -> Result<()> {
        self.repo.table.create_state(state)
    }

    pub fn create_states(&self, states: &[State]) -> Result<()> {
        self.repo.table.create_states(states)
    }

    pub fn read_state(&self, id: &str) -> Option<State> {
        self.repo.table.read_state(id)
    }

    pub fn read_partial_state(&self, id: &str, keys: &[&str]) -> Option<State> {
        self.repo.table.read_partial_state(id, keys)
    }

    pub fn read_states(&self, ids: &[String]) -> Vec<State> {
        self.repo.table.read_states(ids)
    }

    pub fn update_state(&self, id: &str, diff: &StateDiff, change_token: Option<&ChangeTokenUpdater>) -> Result<()> {
        self.repo.table.update_state(id, diff, change_token)
    }

    pub fn delete_states<'a, I>(&self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.repo.table.delete_states(ids)
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    pub fn read_child_state(&self, parent_id: &str, name: &str, ignored: &HashSet<String>) -> Option<State> {
        self.repo.table.read_child_state(parent_id, name, ignored)
    }

    pub fn has_child(&self, parent_id: &str, name: &str, ignored: &HashSet<String>) -> bool {
        self.repo.table.has_child(parent_id, name, ignored)
    }

    pub fn query_key_value(&self, key: &str, value: &StateValue, ignored: &HashSet<String>) -> Vec<State> {
        self.repo.table.query_key_value(key, value, ignored)
    }

    pub fn query_key_value2(
        &self,
        key1: &str,
        value1: &StateValue,
        key2: &str,
        value2: &StateValue,
        ignored: &HashSet<String>,
    ) -> Vec<State> {
        self.repo.table.query_key_value2(key1, value1, key2, value2, ignored)
    }

    pub fn query_key_value_with_operator(
        &self,
        key1: &str,
        value1: &StateValue,
        key2: &str,
        operator: QueryOperator,
        values2: &[StateValue],
        ignored: &HashSet<String>,
    ) -> Vec<State> {
        self.repo
            .table
            .query_key_value_with_operator(key1, value1, key2, operator, values2, ignored)
    }

    pub fn query_key_value_presence(&self, key: &str, value: &StateValue, ignored: &HashSet<String>) -> bool {
        self.repo.table.query_key_value_presence(key, value, ignored)
    }

    pub fn query_key_value_array(&self, key: &str, value: &StateValue) -> SubTree {
        self.repo.table.query_key_value_array(key, value)
    }

    pub fn get_descendants(&self, root_id: &str, keys: &[&str], limit: usize) -> Vec<State> {
        self.repo.table.get_descendants(root_id, keys, limit)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn query_and_fetch(
        &self,
        evaluator: &dyn ExpressionEvaluator,
        order_by: Option<&OrderByClause>,
        distinct_documents: bool,
        limit: usize,
        offset: usize,
        count_up_to: CountUpTo,
    ) -> PartialList<Projection> {
        let page = Page::new(limit, offset, count_up_to);
        query::query_and_fetch(&self.repo.table, evaluator, order_by, distinct_documents, page)
    }

    pub fn scroll(&self, evaluator: &dyn ExpressionEvaluator, batch_size: usize, keep_alive_seconds: u64) -> ScrollResult {
        scroll::scroll(&self.repo.table, evaluator, batch_size, keep_alive_seconds)
    }

    pub fn scroll_next(&self, scroll_id: &str) -> Result<ScrollResult> {
        scroll::scroll_next(scroll_id)
    }

    // ── Locks ─────────────────────────────────────────────────────────────

    fn locks(&self) -> LockManager {
        LockManager::new(Arc::clone(&self.repo.table))
    }

    pub fn get_lock(&self, id: &str) -> Result<Option<Lock>> {
        self.locks().get_lock(id)
    }

    pub fn set_lock(&self, id: &str, lock: &Lock) -> Result<Option<Lock>> {
        self.locks().set_lock(id, lock)
    }

    pub fn remove_lock(&self, id: &str, owner: Option<&str>) -> Result<Option<Lock>> {
        self.locks().remove_lock(id, owner)
    }
}
