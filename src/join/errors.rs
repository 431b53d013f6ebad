//! Join resolver errors.
//!
//! A dangling foreign key is never an error. These only fire when a caller
//! asks to resolve something that is not a reference at all.

use thiserror::Error;

use crate::storage::StoreError;

/// Result type for join resolution
pub type JoinResult<T> = Result<T, JoinError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// The field is not declared as `reference` / `reference_list`
    #[error("field '{collection}.{field}' is not declared as a {expected}")]
    NotAReference {
        collection: String,
        field: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl JoinError {
    pub fn code(&self) -> &'static str {
        match self {
            JoinError::NotAReference { .. } => "ORG_NOT_A_REFERENCE",
            JoinError::Store(e) => e.code(),
        }
    }
}
