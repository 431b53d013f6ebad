//! API layer for orgquery
//!
//! The dispatcher is the single entry point into a domain. Transports
//! (the stdio server, the one-shot CLI) hand it an operation name and raw
//! JSON arguments and get back a `Response`.
//!
//! # Request flow
//!
//! - unknown operation -> `ORG_UNKNOWN_OPERATION`
//! - arguments checked against the operation's `ParamSpec`s -> `ORG_INVALID_ARGUMENT`
//! - domain executes against the record store; missing detail ids -> `ORG_NOT_FOUND`
//! - result or error wrapped as `Response`
//!
//! Summary views are recomputed from the full store on every read.

mod catalog;
mod dispatcher;
mod errors;
mod response;

pub use catalog::{OperationSpec, ParamKind, ParamSpec, ViewSpec};
pub use dispatcher::Dispatcher;
pub use errors::{ApiError, ApiResult};
pub use response::Response;
