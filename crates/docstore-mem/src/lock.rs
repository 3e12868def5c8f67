//! Per-document advisory locks.
//!
//! A lock lives in the document itself as `ecm:lockOwner` and
//! `ecm:lockCreated`. Every operation runs under the document's exclusive
//! section, so two concurrent `set_lock` calls see exactly one winner.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use docstore_state::keys::{KEY_LOCK_CREATED, KEY_LOCK_OWNER};
use docstore_state::{State, StateValue};
use tracing::trace;

use crate::error::{RepositoryError, Result};
use crate::table::StateTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    pub owner: String,
    pub created: DateTime<Utc>,
    /// Set on the lock returned by a removal the owner check refused.
    pub failed: bool,
}

impl Lock {
    pub fn new(owner: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            owner: owner.into(),
            created,
            failed: false,
        }
    }

    fn flagged_failed(mut self) -> Self {
        self.failed = true;
        self
    }

    fn read(state: &State) -> Option<Lock> {
        let owner = state.get_str(KEY_LOCK_OWNER)?;
        let created = state
            .get(KEY_LOCK_CREATED)
            .and_then(StateValue::as_date)
            .copied()
            .unwrap_or_default();
        Some(Lock::new(owner, created))
    }
}

/// A lock held by `old_owner` may be removed by `owner` when the request
/// is administrative (`None`) or comes from the same owner.
pub fn can_lock_be_removed(old_owner: &str, owner: Option<&str>) -> bool {
    match owner {
        None => true,
        Some(owner) => owner == old_owner,
    }
}

/// Lock operations over the documents of one repository.
#[derive(Debug, Clone)]
pub struct LockManager {
    table: Arc<StateTable>,
}

impl LockManager {
    pub(crate) fn new(table: Arc<StateTable>) -> Self {
        Self { table }
    }

    /// The current lock, `None` when unlocked.
    pub fn get_lock(&self, id: &str) -> Result<Option<Lock>> {
        trace!(id, "get lock");
        let slot = self.table.slot(id).ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        let state = slot.lock();
        Ok(Lock::read(&state))
    }

    /// Installs `lock` when the document is unlocked and returns `None`;
    /// otherwise returns the existing lock untouched.
    pub fn set_lock(&self, id: &str, lock: &Lock) -> Result<Option<Lock>> {
        trace!(id, owner = %lock.owner, "set lock");
        let slot = self.table.slot(id).ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        let mut state = slot.lock();
        if let Some(existing) = Lock::read(&state) {
            return Ok(Some(existing));
        }
        state.put(KEY_LOCK_OWNER, lock.owner.as_str());
        state.put(KEY_LOCK_CREATED, lock.created);
        Ok(None)
    }

    /// Removes the lock if [`can_lock_be_removed`] allows it and returns
    /// the removed lock. A refused removal returns the current lock with
    /// `failed` set and leaves it in place. `None` when unlocked.
    pub fn remove_lock(&self, id: &str, owner: Option<&str>) -> Result<Option<Lock>> {
        trace!(id, owner, "remove lock");
        let slot = self.table.slot(id).ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        let mut state = slot.lock();
        let Some(existing) = Lock::read(&state) else {
            return Ok(None);
        };
        if !can_lock_be_removed(&existing.owner, owner) {
            trace!(id, holder = %existing.owner, "remove lock: owner mismatch");
            return Ok(Some(existing.flagged_failed()));
        }
        state.remove(KEY_LOCK_OWNER);
        state.remove(KEY_LOCK_CREATED);
        Ok(Some(existing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use docstore_state::keys::KEY_ID;
    use docstore_state::ApplyOptions;

    fn manager_with(id: &str) -> LockManager {
        let table = Arc::new(StateTable::new(ApplyOptions::default()));
        table.create_state(&State::new().with(KEY_ID, id)).unwrap();
        LockManager::new(table)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_can_lock_be_removed() {
        assert!(can_lock_be_removed("bob", None));
        assert!(can_lock_be_removed("bob", Some("bob")));
        assert!(!can_lock_be_removed("bob", Some("alice")));
    }

    #[test]
    fn test_missing_document() {
        let locks = manager_with("a");
        assert_eq!(locks.get_lock("zz"), Err(RepositoryError::NotFound("zz".into())));
        assert!(locks.set_lock("zz", &Lock::new("bob", at(0))).is_err());
        assert!(locks.remove_lock("zz", None).is_err());
    }

    #[test]
    fn test_remove_unlocked_is_none() {
        let locks = manager_with("a");
        assert_eq!(locks.remove_lock("a", Some("bob")), Ok(None));
    }

    #[test]
    fn test_admin_removal() {
        let locks = manager_with("a");
        let lock = Lock::new("bob", at(10));
        locks.set_lock("a", &lock).unwrap();
        assert_eq!(locks.remove_lock("a", None), Ok(Some(lock)));
        assert_eq!(locks.get_lock("a"), Ok(None));
    }
}
