//! Record store
//!
//! Holds one immutable collection per entity kind, loaded once at startup
//! from a schema and a dataset. Collections keep insertion order for
//! scanning and carry an id index for O(1) lookup.
//!
//! # Invariants
//!
//! - `id` is unique within a collection; a duplicate aborts the load
//! - Nothing is mutated after `RecordStore::load` returns
//! - Foreign keys are not checked here; they may dangle

mod collection;
mod errors;
mod record;
mod store;

pub use collection::Collection;
pub use errors::{StoreError, StoreResult};
pub use record::Record;
pub use store::RecordStore;
