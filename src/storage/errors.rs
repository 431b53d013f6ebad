//! Record store error types
//!
//! Error codes:
//! - ORG_INVALID_COLLECTION: lookup of a collection the domain does not declare
//! - ORG_DUPLICATE_ID: two records in one collection share an id (startup)
//! - ORG_MISSING_ID: a record has no string id (startup)
//! - ORG_UNDECLARED_COLLECTION: dataset carries a collection the schema lacks (startup)
//! - ORG_MALFORMED_DATASET: dataset is not shaped `{collection: [record, ...]}` (startup)

use thiserror::Error;

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Unknown collection name. A caller error, never a data condition.
    #[error("invalid collection: {0}")]
    InvalidCollection(String),

    #[error("duplicate id '{id}' in collection '{collection}'")]
    DuplicateId { collection: String, id: String },

    #[error("record {position} in collection '{collection}' has no string id")]
    MissingId { collection: String, position: usize },

    #[error("dataset collection '{0}' is not declared by the schema")]
    UndeclaredCollection(String),

    #[error("malformed dataset: {0}")]
    MalformedDataset(String),
}

impl StoreError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidCollection(_) => "ORG_INVALID_COLLECTION",
            StoreError::DuplicateId { .. } => "ORG_DUPLICATE_ID",
            StoreError::MissingId { .. } => "ORG_MISSING_ID",
            StoreError::UndeclaredCollection(_) => "ORG_UNDECLARED_COLLECTION",
            StoreError::MalformedDataset(_) => "ORG_MALFORMED_DATASET",
        }
    }
}
