//! Executor error types
//!
//! Error codes:
//! - ORG_INVALID_COLLECTION (from the store)
//! - ORG_INVALID_SORT_KEY: sort on a field the collection does not declare

use thiserror::Error;

use crate::storage::StoreError;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Sort keys must be declared fields
    #[error("cannot sort '{collection}' by undeclared field '{field}'")]
    InvalidSortKey { collection: String, field: String },
}

impl ExecutorError {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Store(e) => e.code(),
            ExecutorError::InvalidSortKey { .. } => "ORG_INVALID_SORT_KEY",
        }
    }
}
