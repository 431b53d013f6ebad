//! Predicate filtering for query execution
//!
//! A query carries a list of criteria; a record must satisfy all of them
//! (AND). A criterion naming several fields is satisfied when any one of
//! them matches (OR within the criterion), which is how free-text "query"
//! parameters search name, email and id at once.
//!
//! A field that is null or absent on a record never matches.

use serde_json::Value;

use crate::storage::Record;

/// A single field-level condition
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Case-insensitive substring of a string field
    Substring(String),
    /// Exact equality; numbers compare by value (`5` equals `5.0`)
    Exact(Value),
    /// Numeric field `>=` the bound (inclusive)
    AtLeast(f64),
    /// Case-insensitive substring of at least one element of a list field
    ListContains(String),
    /// A list field contains this exact value
    ListIncludes(Value),
}

impl Matcher {
    /// Returns true if `value` (never null) satisfies this matcher
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Substring(needle) => value
                .as_str()
                .map(|s| contains_ignore_case(s, needle))
                .unwrap_or(false),
            Matcher::Exact(expected) => values_equal(value, expected),
            Matcher::AtLeast(bound) => value.as_f64().map(|n| n >= *bound).unwrap_or(false),
            Matcher::ListContains(needle) => value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|item| contains_ignore_case(item, needle))
                })
                .unwrap_or(false),
            Matcher::ListIncludes(expected) => value
                .as_array()
                .map(|items| items.iter().any(|item| values_equal(item, expected)))
                .unwrap_or(false),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => actual == expected,
    }
}

/// One logical filter: a matcher applied to one or more fields
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub fields: Vec<String>,
    pub matcher: Matcher,
}

impl Criterion {
    pub fn new(field: impl Into<String>, matcher: Matcher) -> Self {
        Self {
            fields: vec![field.into()],
            matcher,
        }
    }

    /// Criterion satisfied when any of `fields` matches
    pub fn any_of(fields: &[&str], matcher: Matcher) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            matcher,
        }
    }

    pub fn substring(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(field, Matcher::Substring(needle.into()))
    }

    pub fn exact(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Matcher::Exact(value.into()))
    }

    pub fn at_least(field: impl Into<String>, bound: f64) -> Self {
        Self::new(field, Matcher::AtLeast(bound))
    }

    pub fn list_contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(field, Matcher::ListContains(needle.into()))
    }

    pub fn list_includes(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Matcher::ListIncludes(value.into()))
    }

    /// Returns true if any field of this criterion matches the record
    pub fn matches(&self, record: &Record) -> bool {
        self.fields
            .iter()
            .filter_map(|field| record.get(field))
            .any(|value| self.matcher.matches(value))
    }
}

/// Evaluates criteria against records
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a record satisfies every criterion
    pub fn matches(record: &Record, criteria: &[Criterion]) -> bool {
        criteria.iter().all(|criterion| criterion.matches(record))
    }
}
