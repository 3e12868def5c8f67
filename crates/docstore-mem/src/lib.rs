//! In-memory document repository.
//!
//! Documents are [`State`](docstore_state::State) trees keyed by `ecm:id`,
//! mutated through diffs applied under a per-document exclusive section.
//!
//! ```
//! use docstore_mem::{MemRepository, RepositoryConfig};
//! use docstore_state::{Delta, State, StateDiff, StateValue};
//!
//! let repo = MemRepository::open(RepositoryConfig::default()).unwrap();
//! let conn = repo.connection().unwrap();
//! let id = conn.generate_new_id();
//! conn.create_state(&State::new().with("ecm:id", id.as_str()).with("views", 10i64)).unwrap();
//!
//! conn.update_state(&id, &StateDiff::new().delta("views", Delta::long(10, 1)), None).unwrap();
//! assert_eq!(conn.read_state(&id).unwrap().get("views"), Some(&StateValue::long(11)));
//! ```

pub mod change_token;
pub mod config;
pub mod connection;
pub mod error;
pub mod ids;
pub mod lock;
pub mod query;
pub mod repository;
pub mod scroll;
pub mod table;

pub use change_token::ChangeTokenUpdater;
pub use config::{IdType, RepositoryConfig};
pub use connection::Connection;
pub use error::{RepositoryError, Result};
pub use lock::{can_lock_be_removed, Lock, LockManager};
pub use query::{
    CountUpTo, ExpressionEvaluator, FnEvaluator, KeyValueEvaluator, OrderByClause, OrderByExpr, PartialList,
    Projection,
};
pub use repository::MemRepository;
pub use scroll::{ScrollResult, NO_SCROLL_ID};
pub use table::{QueryOperator, StateTable, SubTree};
