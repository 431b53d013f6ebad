//! Transport errors

use std::io;

use thiserror::Error;

/// Failures of the stdio loop itself. Bad requests are answered on the
/// wire and never surface here.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Io(_) => "ORG_SERVER_IO",
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
