//! Overall statistics over a record sequence

use serde::Serialize;
use serde_json::Value;

use crate::storage::Record;

/// Group name used when the grouping field carries no value
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Count, sum, average, min and max of one numeric field.
///
/// Only records that carry a number at the path contribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub sum: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summary of `path` over `records`; `None` when no record carries a
    /// number there.
    pub fn over<'a, I>(records: I, path: &str) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        Self::from_values(records.into_iter().filter_map(|r| r.number(path)))
    }

    /// Summary of raw values; `None` for an empty input
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter();
        let first = values.next()?;

        let mut summary = Self {
            count: 1,
            sum: first,
            average: first,
            min: first,
            max: first,
        };

        for value in values {
            summary.count += 1;
            summary.sum += value;
            summary.min = summary.min.min(value);
            summary.max = summary.max.max(value);
        }
        summary.average = summary.sum / summary.count as f64;

        Some(summary)
    }
}

/// Grouping key of a record: the field value as text, or `"Unknown"`
pub fn group_key(record: &Record, path: &str) -> String {
    match record.get(path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
        None => UNKNOWN_GROUP.to_string(),
    }
}

/// Category counts in first-seen order
pub fn count_by<'a, I>(records: I, path: &str) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in records {
        let key = group_key(record, path);
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
}

/// Category counts as a JSON object, keys in first-seen order
pub fn count_map<'a, I>(records: I, path: &str) -> serde_json::Map<String, Value>
where
    I: IntoIterator<Item = &'a Record>,
{
    count_by(records, path)
        .into_iter()
        .map(|(k, n)| (k, Value::from(n)))
        .collect()
}

/// Number of records satisfying `predicate`
pub fn count_where<'a, I, P>(records: I, predicate: P) -> usize
where
    I: IntoIterator<Item = &'a Record>,
    P: Fn(&Record) -> bool,
{
    records.into_iter().filter(|r| predicate(r)).count()
}

/// Number of records whose string field is one of `values`
pub fn count_in<'a, I>(records: I, path: &str, values: &[&str]) -> usize
where
    I: IntoIterator<Item = &'a Record>,
{
    count_where(records, |r| {
        r.str_field(path).map(|v| values.contains(&v)).unwrap_or(false)
    })
}
