//! Join resolver
//!
//! Follows foreign keys declared in the domain schema. Missing targets
//! degrade to explicit markers instead of failing.

mod errors;
mod resolver;

pub use errors::{JoinError, JoinResult};
pub use resolver::{label, JoinResolver, Reference, ResolvedList, UNKNOWN_LABEL};
