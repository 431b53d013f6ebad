//! Schema error types
//!
//! Error codes:
//! - ORG_SCHEMA_MALFORMED: schema artifact is not valid JSON or not a schema
//! - ORG_SCHEMA_INVALID: schema parsed but its structure is inconsistent
//! - ORG_SCHEMA_IO: schema file could not be read

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema loading errors. All of them abort startup.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Artifact could not be parsed
    #[error("malformed schema '{source_name}': {message}")]
    Malformed {
        source_name: String,
        message: String,
    },

    /// Schema parsed but failed structural validation
    #[error("invalid schema '{source_name}': {message}")]
    Invalid {
        source_name: String,
        message: String,
    },

    /// Schema file could not be read
    #[error("failed to read schema '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn invalid(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Malformed { .. } => "ORG_SCHEMA_MALFORMED",
            SchemaError::Invalid { .. } => "ORG_SCHEMA_INVALID",
            SchemaError::Io { .. } => "ORG_SCHEMA_IO",
        }
    }
}
