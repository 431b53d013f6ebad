//! Domain schemas
//!
//! A schema declares every collection of one domain: field names, field
//! types, enumerations, and foreign-key targets. The engine is generic and
//! learns everything domain-specific from here.
//!
//! Enumerated values are declared but never enforced on records.

mod errors;
mod loader;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{CollectionSchema, DomainSchema, FieldDef, FieldType};
