//! Dispatcher error types
//!
//! Subsystem errors pass through with their original codes.

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::join::JoinError;
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Unknown resource: {0}")]
    UnknownView(String),

    #[error("Invalid argument '{param}': {reason}")]
    InvalidArgument { param: String, reason: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Join(#[from] JoinError),
}

impl ApiError {
    pub fn invalid_argument(param: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::InvalidArgument {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::UnknownOperation(_) => "ORG_UNKNOWN_OPERATION",
            ApiError::UnknownView(_) => "ORG_UNKNOWN_VIEW",
            ApiError::InvalidArgument { .. } => "ORG_INVALID_ARGUMENT",
            ApiError::NotFound { .. } => "ORG_NOT_FOUND",
            ApiError::Store(e) => e.code(),
            ApiError::Executor(e) => e.code(),
            ApiError::Join(e) => e.code(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::UnknownOperation("x".into()).code(), "ORG_UNKNOWN_OPERATION");
        assert_eq!(ApiError::UnknownView("x".into()).code(), "ORG_UNKNOWN_VIEW");
        assert_eq!(ApiError::invalid_argument("tier", "bad").code(), "ORG_INVALID_ARGUMENT");
        assert_eq!(ApiError::not_found("Employee", "emp_999").code(), "ORG_NOT_FOUND");
    }

    #[test]
    fn test_not_found_names_the_id() {
        let err = ApiError::not_found("Employee", "emp_999");
        assert_eq!(err.to_string(), "Employee emp_999 not found");
    }

    #[test]
    fn test_store_error_passes_through() {
        let err: ApiError = StoreError::InvalidCollection("invoices".into()).into();
        assert_eq!(err.code(), "ORG_INVALID_COLLECTION");
        assert!(err.to_string().contains("invoices"));
    }
}
