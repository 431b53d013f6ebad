//! Result sorting for query execution
//!
//! Stable: records that compare equal keep their filtered order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::Record;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// What a record is sorted by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// The value at one (dotted) path
    Field(String),
    /// Sum of the numeric values at several paths, e.g. critical + high
    /// vulnerabilities. Missing addends count as zero; a record with none
    /// of them is treated as missing.
    Sum(Vec<String>),
}

impl SortKey {
    pub fn field(path: impl Into<String>) -> Self {
        SortKey::Field(path.into())
    }

    pub fn sum(paths: &[&str]) -> Self {
        SortKey::Sum(paths.iter().map(|p| p.to_string()).collect())
    }

    /// Every path this key reads
    pub fn paths(&self) -> Vec<&str> {
        match self {
            SortKey::Field(path) => vec![path.as_str()],
            SortKey::Sum(paths) => paths.iter().map(String::as_str).collect(),
        }
    }

    fn extract(&self, record: &Record) -> Option<Value> {
        match self {
            SortKey::Field(path) => record.get(path).cloned(),
            SortKey::Sum(paths) => {
                let addends: Vec<f64> = paths.iter().filter_map(|p| record.number(p)).collect();
                if addends.is_empty() {
                    None
                } else {
                    Some(Value::from(addends.iter().sum::<f64>()))
                }
            }
        }
    }
}

/// Sort specification applied after filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Desc,
        }
    }
}

/// Sorts records
pub struct ResultSorter;

impl ResultSorter {
    /// Stable sort. Missing values sort first ascending, last descending.
    pub fn sort(records: &mut [&Record], spec: &SortSpec) {
        let mut keyed: Vec<(Option<Value>, &Record)> = records
            .iter()
            .map(|record| (spec.key.extract(record), *record))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            let ordering = compare_values(a.as_ref(), b.as_ref());
            match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        for (slot, (_, record)) in records.iter_mut().zip(keyed) {
            *slot = record;
        }
    }
}

/// Total order over optional JSON values.
///
/// - missing < bool < number < string
/// - same types use natural ordering; arrays and objects compare equal
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}
