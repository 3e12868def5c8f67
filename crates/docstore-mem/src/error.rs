use docstore_state::StateError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("document already exists: {0}")]
    AlreadyExists(String),
    #[error("concurrent update: {0}")]
    ConcurrentUpdate(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("state has no ecm:id")]
    MissingId,
    #[error(transparent)]
    UnsupportedOperation(#[from] StateError),
    #[error("unknown scroll id: {0}")]
    UnknownScroll(String),
    #[error("repository is closed: {0}")]
    Closed(String),
    #[error("invalid repository configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
