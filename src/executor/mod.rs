//! Query engine
//!
//! Applies criteria to one collection and returns the ordered subset of
//! matching records.
//!
//! # Invariants
//!
//! - The result is always a subset of the collection
//! - Without a sort, results keep insertion order
//! - Sorting is stable; ties keep filtered order
//! - Filtering on an undeclared field degrades to "no constraint"

mod errors;
mod executor;
mod filters;
mod result;
mod sorter;

pub use errors::{ExecutorError, ExecutorResult};
pub use executor::{Query, QueryExecutor};
pub use filters::{Criterion, Matcher, PredicateFilter};
pub use result::QueryResult;
pub use sorter::{compare_values, ResultSorter, SortDirection, SortKey, SortSpec};
