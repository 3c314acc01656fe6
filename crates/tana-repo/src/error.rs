//! Error taxonomy for repository operations.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Repository operation errors.
///
/// Nothing is caught inside the engine: store and filesystem errors pass
/// through unchanged, everything else names the precondition that failed.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The argument is not a usable virtual path (empty or not absolute).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A `get`/`list_children`/`has_children` target did not resolve.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// `find`/`contains` received a query language other than glob/literal.
    #[error("unsupported query language: {0}")]
    UnsupportedLanguage(String),

    /// `add` received a resource that is neither filesystem- nor link-backed.
    #[error("unsupported resource: {0}")]
    UnsupportedResource(String),

    /// `remove` matched resources that are not mappings.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The mapping store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Filesystem probing or directory iteration failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
