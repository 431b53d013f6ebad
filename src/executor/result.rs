//! Result types for query execution

use crate::storage::Record;

/// Records matching a query, in result order
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    /// Matching records, borrowed from the store
    pub records: Vec<&'a Record>,
    /// Number of records examined
    pub scanned: usize,
}

impl<'a> QueryResult<'a> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    /// JSON copies of every record, for a structured report
    pub fn to_values(&self) -> Vec<serde_json::Value> {
        self.records.iter().map(|r| r.to_value()).collect()
    }
}
