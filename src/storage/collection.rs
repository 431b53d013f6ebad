//! Ordered, id-indexed collection of records

use std::collections::HashMap;

use super::errors::{StoreError, StoreResult};
use super::record::Record;
use crate::schema::CollectionSchema;

/// All records of one entity kind, in load order
#[derive(Debug)]
pub struct Collection {
    schema: CollectionSchema,
    records: Vec<Record>,
    by_id: HashMap<String, usize>,
}

impl Collection {
    /// Builds a collection, indexing every record by id.
    ///
    /// Fails on a record without a string id or on a repeated id.
    pub fn new(schema: CollectionSchema, records: Vec<Record>) -> StoreResult<Self> {
        let mut by_id = HashMap::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let id = record.id().ok_or_else(|| StoreError::MissingId {
                collection: schema.name.clone(),
                position,
            })?;

            if by_id.insert(id.to_string(), position).is_some() {
                return Err(StoreError::DuplicateId {
                    collection: schema.name.clone(),
                    id: id.to_string(),
                });
            }
        }

        Ok(Self {
            schema,
            records,
            by_id,
        })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// O(1) lookup by id
    pub fn get_by_id(&self, id: &str) -> Option<&Record> {
        self.by_id.get(id).map(|&position| &self.records[position])
    }

    /// First record whose string field equals `value`.
    ///
    /// Lookups on `id` use the index; any other key is a scan.
    pub fn find_by(&self, field: &str, value: &str) -> Option<&Record> {
        if field == "id" {
            return self.get_by_id(value);
        }
        self.records
            .iter()
            .find(|record| record.str_field(field) == Some(value))
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
