//! Store-layer error model.

use thiserror::Error;

/// Result type used across the store layer.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
///
/// These are infrastructure/query-shape failures, as opposed to domain
/// errors (validation, invariants). Not-found is never an error here:
/// point lookups return `None` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A non-default selection (`first`, `last`, `average`) matched nothing.
    #[error("sequence contains no matching elements")]
    NoElements,

    /// A `single` selection matched a set whose size is not exactly one.
    #[error("expected exactly one matching element, found {found}")]
    Cardinality { found: usize },

    /// Commit of the current unit of work failed. Staged changes are
    /// retained; the committed state is untouched.
    #[error("commit failed: {0}")]
    Commit(String),

    /// Read-path backend failure (lock poisoning, lost connection).
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::Commit(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
