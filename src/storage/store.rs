//! The record store: every collection of one domain, built once.

use std::collections::HashMap;

use serde_json::Value;

use super::collection::Collection;
use super::errors::{StoreError, StoreResult};
use super::record::Record;
use crate::schema::{CollectionSchema, DomainSchema};

/// Immutable set of named collections.
///
/// Built by [`RecordStore::load`] before any request is served and only
/// ever handed out as `&RecordStore` afterwards.
#[derive(Debug)]
pub struct RecordStore {
    schema: DomainSchema,
    collections: Vec<Collection>,
    positions: HashMap<String, usize>,
}

impl RecordStore {
    /// Builds the store from a validated schema and a dataset of the form
    /// `{ "<collection>": [ {...}, ... ] }`.
    ///
    /// Declared collections missing from the dataset load empty. Dataset
    /// keys the schema does not declare are rejected.
    pub fn load(schema: DomainSchema, dataset: Value) -> StoreResult<Self> {
        let mut dataset = match dataset {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::MalformedDataset(
                    "top level must be an object of collections".into(),
                ))
            }
        };

        if let Some(undeclared) = dataset.keys().find(|name| schema.collection(name).is_none()) {
            return Err(StoreError::UndeclaredCollection(undeclared.clone()));
        }

        let mut collections = Vec::with_capacity(schema.collections.len());
        let mut positions = HashMap::with_capacity(schema.collections.len());

        for collection_schema in &schema.collections {
            let records = match dataset.remove(&collection_schema.name) {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => Self::records_of(&collection_schema.name, items)?,
                Some(_) => {
                    return Err(StoreError::MalformedDataset(format!(
                        "collection '{}' must be an array",
                        collection_schema.name
                    )))
                }
            };

            positions.insert(collection_schema.name.clone(), collections.len());
            collections.push(Collection::new(collection_schema.clone(), records)?);
        }

        Ok(Self {
            schema,
            collections,
            positions,
        })
    }

    fn records_of(collection: &str, items: Vec<Value>) -> StoreResult<Vec<Record>> {
        items
            .into_iter()
            .enumerate()
            .map(|(position, item)| {
                Record::from_value(item).ok_or_else(|| {
                    StoreError::MalformedDataset(format!(
                        "record {} in collection '{}' is not an object",
                        position, collection
                    ))
                })
            })
            .collect()
    }

    /// Ordered collection by name
    pub fn get(&self, collection: &str) -> StoreResult<&Collection> {
        self.positions
            .get(collection)
            .map(|&i| &self.collections[i])
            .ok_or_else(|| StoreError::InvalidCollection(collection.to_string()))
    }

    /// O(1) record lookup; `Ok(None)` when the id is absent
    pub fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<&Record>> {
        Ok(self.get(collection)?.get_by_id(id))
    }

    pub fn collection_schema(&self, collection: &str) -> StoreResult<&CollectionSchema> {
        Ok(self.get(collection)?.schema())
    }

    pub fn schema(&self) -> &DomainSchema {
        &self.schema
    }

    pub fn domain(&self) -> &str {
        &self.schema.domain
    }

    /// Collections in schema declaration order
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter()
    }

    pub fn total_records(&self) -> usize {
        self.collections.iter().map(Collection::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaLoader;
    use serde_json::json;

    fn schema() -> DomainSchema {
        SchemaLoader::parse(
            "test",
            r#"{
                "domain": "crm",
                "collections": [
                    { "name": "customers", "label": ["name"], "fields": {
                        "id": { "type": "string" },
                        "name": { "type": "string" }
                    }},
                    { "name": "orders", "fields": {
                        "id": { "type": "string" },
                        "customerId": { "type": "reference", "collection": "customers" }
                    }}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_load_and_lookup() {
        let store = RecordStore::load(
            schema(),
            json!({
                "customers": [
                    {"id": "cust_001", "name": "Acme Corporation"},
                    {"id": "cust_002", "name": "Brightside"}
                ],
                "orders": [{"id": "ord_001", "customerId": "cust_001"}]
            }),
        )
        .unwrap();

        assert_eq!(store.domain(), "crm");
        assert_eq!(store.get("customers").unwrap().len(), 2);
        assert_eq!(store.total_records(), 3);
        assert_eq!(
            store
                .get_by_id("customers", "cust_002")
                .unwrap()
                .unwrap()
                .str_field("name"),
            Some("Brightside")
        );
        assert!(store.get_by_id("customers", "cust_999").unwrap().is_none());
    }

    #[test]
    fn test_unknown_collection_is_invalid() {
        let store = RecordStore::load(schema(), json!({})).unwrap();
        let err = store.get("invoices").unwrap_err();
        assert_eq!(err, StoreError::InvalidCollection("invoices".into()));
        assert_eq!(err.code(), "ORG_INVALID_COLLECTION");
        assert!(store.get_by_id("invoices", "x").is_err());
    }

    #[test]
    fn test_declared_but_absent_collection_loads_empty() {
        let store = RecordStore::load(schema(), json!({"customers": []})).unwrap();
        assert!(store.get("orders").unwrap().is_empty());
    }

    #[test]
    fn test_undeclared_dataset_collection_rejected() {
        let err = RecordStore::load(schema(), json!({"invoices": []})).unwrap_err();
        assert_eq!(err.code(), "ORG_UNDECLARED_COLLECTION");
    }

    #[test]
    fn test_duplicate_id_fails_load() {
        let err = RecordStore::load(
            schema(),
            json!({"customers": [{"id": "c1"}, {"id": "c1"}]}),
        )
        .unwrap_err();
        assert_eq!(err.code(), "ORG_DUPLICATE_ID");
    }

    #[test]
    fn test_non_object_record_rejected() {
        let err = RecordStore::load(schema(), json!({"customers": ["c1"]})).unwrap_err();
        assert_eq!(err.code(), "ORG_MALFORMED_DATASET");
    }

    #[test]
    fn test_collections_in_declaration_order() {
        let store = RecordStore::load(schema(), json!({})).unwrap();
        let names: Vec<_> = store.collections().map(Collection::name).collect();
        assert_eq!(names, vec!["customers", "orders"]);
    }
}
