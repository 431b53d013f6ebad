//! A single record: one JSON object with typed accessors.
//!
//! Fields are addressed by dotted path (`securityVulns.critical`). A field
//! that is absent and a field that is `null` are the same thing to every
//! accessor here: no value.

use serde::Serialize;
use serde_json::{Map, Value};

/// One entity instance inside a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builds a record from a JSON value; `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// The record's `id`, if it is a string
    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    /// Value at a dotted path. `null` reads as absent.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }

    pub fn str_field(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn number(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    pub fn bool_field(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn list(&self, path: &str) -> Option<&Vec<Value>> {
        self.get(path).and_then(Value::as_array)
    }

    /// String elements of a list field; non-strings are skipped
    pub fn str_list(&self, path: &str) -> Vec<&str> {
        self.list(path)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true if the path carries a non-null value
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repo() -> Record {
        Record::from_value(json!({
            "id": "repo_001",
            "name": "search-api",
            "testCoverage": 78.5,
            "securityVulns": { "critical": 1, "high": 3 },
            "topics": ["search", "rust"],
            "archived": false,
            "owner": null
        }))
        .unwrap()
    }

    #[test]
    fn test_from_value_requires_object() {
        assert!(Record::from_value(json!([1, 2])).is_none());
        assert!(Record::from_value(json!("x")).is_none());
    }

    #[test]
    fn test_typed_accessors() {
        let r = repo();
        assert_eq!(r.id(), Some("repo_001"));
        assert_eq!(r.str_field("name"), Some("search-api"));
        assert_eq!(r.number("testCoverage"), Some(78.5));
        assert_eq!(r.bool_field("archived"), Some(false));
        assert_eq!(r.str_list("topics"), vec!["search", "rust"]);
    }

    #[test]
    fn test_dotted_path() {
        let r = repo();
        assert_eq!(r.number("securityVulns.critical"), Some(1.0));
        assert_eq!(r.number("securityVulns.medium"), None);
        assert_eq!(r.get("name.inner"), None);
    }

    #[test]
    fn test_null_reads_as_absent() {
        let r = repo();
        assert!(r.get("owner").is_none());
        assert!(!r.has("owner"));
        assert!(!r.has("missing"));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let r = repo();
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["name"], "search-api");
        assert_eq!(value, r.to_value());
    }
}
