//! Domain loading errors
//!
//! Error codes:
//! - ORG_DATASET_IO: records file could not be read
//! - ORG_DATASET_MALFORMED: records artifact is not valid JSON
//! - ORG_DOMAIN_MISMATCH: schema artifact declares a different domain
//! - schema and store codes pass through

use thiserror::Error;

use crate::schema::SchemaError;
use crate::storage::StoreError;

/// Result type for domain loading
pub type DomainResult<T> = Result<T, DomainError>;

/// Failures while building a domain's record store. All of them abort
/// startup.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to read records '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed records '{source_name}': {source}")]
    Malformed {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema declares domain '{found}', expected '{expected}'")]
    DomainMismatch { expected: String, found: String },
}

impl DomainError {
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Schema(e) => e.code(),
            DomainError::Store(e) => e.code(),
            DomainError::Io { .. } => "ORG_DATASET_IO",
            DomainError::Malformed { .. } => "ORG_DATASET_MALFORMED",
            DomainError::DomainMismatch { .. } => "ORG_DOMAIN_MISMATCH",
        }
    }
}
