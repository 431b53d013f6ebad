//! Foreign-key resolution across collections.
//!
//! Single references resolve to one of three states: the target record, a
//! dangling id, or unset (null/absent key). Reference lists keep the
//! declared cardinality separate from what actually resolved: `declared`
//! is what gets reported as a count, `resolved` is what gets displayed.

use serde_json::Value;

use super::errors::{JoinError, JoinResult};
use crate::schema::{CollectionSchema, FieldType};
use crate::storage::{Collection, Record, RecordStore};

/// Display text for a key that names a missing record
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Outcome of resolving a single foreign key
#[derive(Debug, Clone, PartialEq)]
pub enum Reference<'a> {
    Resolved(&'a Record),
    /// Key present but no target record has it
    Dangling(String),
    /// Key null or absent
    Unset,
}

impl<'a> Reference<'a> {
    pub fn record(&self) -> Option<&'a Record> {
        match self {
            Reference::Resolved(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }

    /// Display label of the target.
    ///
    /// Dangling keys render as `"Unknown"`; unset keys render as `unset`.
    pub fn label_or(&self, target: &CollectionSchema, unset: &str) -> String {
        match self {
            Reference::Resolved(record) => label(target, record),
            Reference::Dangling(_) => UNKNOWN_LABEL.to_string(),
            Reference::Unset => unset.to_string(),
        }
    }
}

/// Outcome of resolving a list of foreign keys
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedList<'a> {
    /// Length of the key list as stored on the record
    pub declared: usize,
    /// Targets that exist, in list order
    pub resolved: Vec<&'a Record>,
    /// Keys that named no record, in list order
    pub dangling: Vec<String>,
}

impl<'a> ResolvedList<'a> {
    /// Labels of the resolved targets only
    pub fn labels(&self, target: &CollectionSchema) -> Vec<String> {
        self.resolved.iter().map(|r| label(target, r)).collect()
    }
}

/// Display label for a record: its collection's label fields joined by a
/// space, or its id when none of them carry a value.
pub fn label(schema: &CollectionSchema, record: &Record) -> String {
    let parts: Vec<String> = schema
        .label
        .iter()
        .filter_map(|field| record.get(field).map(display_scalar))
        .collect();

    if parts.is_empty() {
        record.id().unwrap_or(UNKNOWN_LABEL).to_string()
    } else {
        parts.join(" ")
    }
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolves foreign keys against a record store
#[derive(Debug, Clone, Copy)]
pub struct JoinResolver<'s> {
    store: &'s RecordStore,
}

impl<'s> JoinResolver<'s> {
    pub fn new(store: &'s RecordStore) -> Self {
        Self { store }
    }

    /// Resolves a `reference` field of `record` (a member of `collection`)
    pub fn resolve(&self, collection: &str, record: &Record, field: &str) -> JoinResult<Reference<'s>> {
        let (target, key) = self.target_of(collection, field, false)?;

        let Some(value) = record.get(field) else {
            return Ok(Reference::Unset);
        };

        let id = key_string(value);
        Ok(match target.find_by(key, &id) {
            Some(found) => Reference::Resolved(found),
            None => Reference::Dangling(id),
        })
    }

    /// Resolves a `reference_list` field of `record`
    pub fn resolve_many(
        &self,
        collection: &str,
        record: &Record,
        field: &str,
    ) -> JoinResult<ResolvedList<'s>> {
        let (target, key) = self.target_of(collection, field, true)?;

        let mut list = ResolvedList::default();
        let Some(items) = record.list(field) else {
            return Ok(list);
        };

        list.declared = items.len();
        for item in items {
            let id = key_string(item);
            match target.find_by(key, &id) {
                Some(found) => list.resolved.push(found),
                None => list.dangling.push(id),
            }
        }
        Ok(list)
    }

    /// Resolves a `reference_list` field together with the display labels of
    /// the targets that exist
    pub fn resolve_many_labels(
        &self,
        collection: &str,
        record: &Record,
        field: &str,
    ) -> JoinResult<(ResolvedList<'s>, Vec<String>)> {
        let list = self.resolve_many(collection, record, field)?;
        let (target, _) = self.target_of(collection, field, true)?;
        let labels = list.labels(target.schema());
        Ok((list, labels))
    }

    /// Resolves a `reference` field straight to a display label
    pub fn resolve_label(
        &self,
        collection: &str,
        record: &Record,
        field: &str,
        unset: &str,
    ) -> JoinResult<String> {
        let reference = self.resolve(collection, record, field)?;
        let (target, _) = self.target_of(collection, field, false)?;
        Ok(reference.label_or(target.schema(), unset))
    }

    /// Display label for a record of `collection`
    pub fn label(&self, collection: &str, record: &Record) -> JoinResult<String> {
        Ok(label(self.store.collection_schema(collection)?, record))
    }

    /// Records of `collection` whose `field` references `record` (the
    /// reverse direction of a join, e.g. the incidents of a repository).
    pub fn referencing(
        &self,
        collection: &str,
        field: &str,
        record: &Record,
    ) -> JoinResult<Vec<&'s Record>> {
        let source = self.store.get(collection)?;
        let (_, key) = self.target_of(collection, field, false)?;
        let Some(wanted) = record.get(key).map(key_string) else {
            return Ok(Vec::new());
        };

        Ok(source
            .iter()
            .filter(|candidate| candidate.get(field).map(key_string).as_deref() == Some(wanted.as_str()))
            .collect())
    }

    fn target_of(
        &self,
        collection: &str,
        field: &str,
        list: bool,
    ) -> JoinResult<(&'s Collection, &'s str)> {
        let schema = self.store.collection_schema(collection)?;
        let not_a_reference = || JoinError::NotAReference {
            collection: collection.to_string(),
            field: field.to_string(),
            expected: if list { "reference_list" } else { "reference" },
        };

        let def = schema.field(field).ok_or_else(not_a_reference)?;
        let (target, key) = match (&def.field_type, list) {
            (FieldType::Reference { collection, key }, false)
            | (FieldType::ReferenceList { collection, key }, true) => (collection, key),
            _ => return Err(not_a_reference()),
        };

        Ok((self.store.get(target)?, key.as_str()))
    }
}
