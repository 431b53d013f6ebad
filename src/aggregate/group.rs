//! Group-by breakdowns.
//!
//! Groups appear in first-seen order. Ranking is a stable sort, so groups
//! with equal metrics keep first-seen order as the tie-break.

use std::cmp::Ordering;

use serde::Serialize;

use super::stats::{group_key, NumericSummary};
use crate::executor::SortDirection;
use crate::storage::Record;

/// Statistics for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub key: String,
    /// Records in the group, whether or not they carry the value
    pub count: usize,
    /// Summary of the value field; `None` if no member carries it
    pub values: Option<NumericSummary>,
}

impl GroupStats {
    pub fn sum(&self) -> f64 {
        self.values.map(|v| v.sum).unwrap_or(0.0)
    }

    pub fn average(&self) -> Option<f64> {
        self.values.map(|v| v.average)
    }

    pub fn min(&self) -> Option<f64> {
        self.values.map(|v| v.min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.map(|v| v.max)
    }

    fn metric(&self, metric: GroupMetric) -> Option<f64> {
        match metric {
            GroupMetric::Count => Some(self.count as f64),
            GroupMetric::Sum => Some(self.sum()),
            GroupMetric::Average => self.average(),
            GroupMetric::Min => self.min(),
            GroupMetric::Max => self.max(),
        }
    }
}

/// Per-group metric a breakdown can be ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMetric {
    Count,
    Sum,
    Average,
    Min,
    Max,
}

/// Result of partitioning records by one field
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Breakdown {
    groups: Vec<GroupStats>,
}

impl Breakdown {
    pub fn groups(&self) -> &[GroupStats] {
        &self.groups
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupStats> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&GroupStats> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Sum of group counts; always the size of the grouped input
    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }

    /// Groups stably sorted by `metric`. Groups without the metric sort
    /// first ascending and last descending.
    pub fn ranked(mut self, metric: GroupMetric, direction: SortDirection) -> Self {
        self.groups.sort_by(|a, b| {
            let ordering = compare_metric(a.metric(metric), b.metric(metric));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        self
    }
}

impl<'a> IntoIterator for &'a Breakdown {
    type Item = &'a GroupStats;
    type IntoIter = std::slice::Iter<'a, GroupStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

fn compare_metric(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Partitions `records` by `key_path` and summarises `value_path` per
/// group. Records without a key land in group `"Unknown"`.
pub fn group_by<'a, I>(records: I, key_path: &str, value_path: &str) -> Breakdown
where
    I: IntoIterator<Item = &'a Record>,
{
    group_pairs(
        records
            .into_iter()
            .map(|record| (group_key(record, key_path), record.number(value_path))),
    )
}

/// Groups pre-computed `(key, value)` pairs. Used when the key comes from a
/// joined record rather than a field of the grouped record itself.
pub fn group_pairs<I>(pairs: I) -> Breakdown
where
    I: IntoIterator<Item = (String, Option<f64>)>,
{
    let mut members: Vec<(String, usize, Vec<f64>)> = Vec::new();

    for (key, value) in pairs {
        let index = match members.iter().position(|(k, _, _)| *k == key) {
            Some(index) => index,
            None => {
                members.push((key, 0, Vec::new()));
                members.len() - 1
            }
        };
        let (_, count, values) = &mut members[index];
        *count += 1;
        values.extend(value);
    }

    let groups = members
        .into_iter()
        .map(|(key, count, values)| GroupStats {
            key,
            count,
            values: NumericSummary::from_values(values),
        })
        .collect();

    Breakdown { groups }
}
