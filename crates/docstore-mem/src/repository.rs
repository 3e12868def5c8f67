//! The repository handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use docstore_state::keys::{KEY_ID, KEY_NAME, KEY_PRIMARY_TYPE};
use docstore_state::State;
use tracing::info;

use crate::config::RepositoryConfig;
use crate::connection::Connection;
use crate::error::{RepositoryError, Result};
use crate::ids::IdGenerator;
use crate::lock::LockManager;
use crate::table::StateTable;

/// Primary type of the document created by `create_root`.
pub const ROOT_TYPE: &str = "Root";

#[derive(Debug)]
pub(crate) struct RepositoryInner {
    pub(crate) config: RepositoryConfig,
    pub(crate) table: Arc<StateTable>,
    pub(crate) ids: IdGenerator,
    root_id: Option<String>,
    closed: AtomicBool,
}

/// An open in-memory repository. Cloning yields another handle to the same
/// store.
#[derive(Debug, Clone)]
pub struct MemRepository {
    inner: Arc<RepositoryInner>,
}

impl MemRepository {
    pub fn open(config: RepositoryConfig) -> Result<Self> {
        config.validate()?;
        let table = Arc::new(StateTable::new(config.apply_options()));
        let ids = IdGenerator::new(config.id_type, config.debug_ids);

        let root_id = if config.create_root {
            let id = ids.next_id();
            let root = State::new()
                .with(KEY_ID, id.as_str())
                .with(KEY_NAME, "")
                .with(KEY_PRIMARY_TYPE, ROOT_TYPE);
            table.create_state(&root)?;
            Some(id)
        } else {
            None
        };

        info!(
            name = %config.name,
            id_type = ?config.id_type,
            root = root_id.as_deref(),
            "repository opened"
        );
        Ok(Self {
            inner: Arc::new(RepositoryInner {
                config,
                table,
                ids,
                root_id,
                closed: AtomicBool::new(false),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.inner.config
    }

    /// Id of the root document, when one was created on open.
    pub fn root_id(&self) -> Option<&str> {
        self.inner.root_id.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Marks the repository closed. Existing connections keep working; new
    /// ones are refused.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            info!(name = %self.inner.config.name, documents = self.inner.table.len(), "repository closed");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(RepositoryError::Closed(self.inner.config.name.clone()));
        }
        Ok(())
    }

    pub fn connection(&self) -> Result<Connection> {
        self.ensure_open()?;
        Ok(Connection::new(Arc::clone(&self.inner)))
    }

    pub fn lock_manager(&self) -> Result<LockManager> {
        self.ensure_open()?;
        Ok(LockManager::new(Arc::clone(&self.inner.table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdType;

    #[test]
    fn test_open_with_root() {
        let repo = MemRepository::open(
            RepositoryConfig::default()
                .with_create_root(true)
                .with_debug_ids(true),
        )
        .unwrap();
        assert_eq!(repo.root_id(), Some("UUID_1"));
        let root = repo.connection().unwrap().read_state("UUID_1").unwrap();
        assert_eq!(root.get_str(KEY_PRIMARY_TYPE), Some(ROOT_TYPE));
        assert_eq!(root.get_str(KEY_NAME), Some(""));
    }

    #[test]
    fn test_open_without_root() {
        let repo = MemRepository::open(RepositoryConfig::default().with_id_type(IdType::Sequence)).unwrap();
        assert_eq!(repo.root_id(), None);
        assert_eq!(repo.connection().unwrap().generate_new_id(), "1");
    }

    #[test]
    fn test_close_refuses_new_connections() {
        let repo = MemRepository::open(RepositoryConfig::default().with_name("r1")).unwrap();
        let conn = repo.connection().unwrap();
        repo.close();
        assert!(repo.is_closed());
        assert!(matches!(repo.connection(), Err(RepositoryError::Closed(name)) if name == "r1"));
        assert!(repo.lock_manager().is_err());
        assert!(conn.read_state("anything").is_none());
    }

    #[test]
    fn test_invalid_config() {
        let err = MemRepository::open(RepositoryConfig::default().with_name("")).unwrap_err();
        assert!(matches!(err, RepositoryError::Config(_)));
    }
}
