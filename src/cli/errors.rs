//! CLI-specific error types
//!
//! Every CLI error is fatal: it is printed to stderr and the process exits
//! non-zero.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::domains::DomainError;
use crate::server::ServerError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("--args is not valid JSON: {0}")]
    InvalidArgs(#[source] serde_json::Error),

    /// The request ran and was answered with an error response
    #[error("request failed with {code}")]
    RequestFailed { code: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    pub fn code(&self) -> &str {
        match self {
            CliError::Config(e) => e.code(),
            CliError::Domain(e) => e.code(),
            CliError::Server(e) => e.code(),
            CliError::InvalidArgs(_) => "ORG_CLI_INVALID_ARGS",
            CliError::RequestFailed { code } => code,
            CliError::Io(_) => "ORG_CLI_IO",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
