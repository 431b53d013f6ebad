//! Query executor
//!
//! Execution flow (strict order):
//! 1. Resolve the collection (unknown name fails)
//! 2. Drop criterion fields the collection does not declare, logging each
//! 3. Scan in insertion order, keeping records that satisfy every criterion
//! 4. Apply the sort, if any (stable)
//! 5. Return the ordered subset and the scan count

use super::errors::{ExecutorError, ExecutorResult};
use super::filters::{Criterion, PredicateFilter};
use super::result::QueryResult;
use super::sorter::{ResultSorter, SortSpec};
use crate::join::JoinResolver;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::schema::CollectionSchema;
use crate::storage::RecordStore;

/// A filter-and-sort request against one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub criteria: Vec<Criterion>,
    pub sort: Option<SortSpec>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            criteria: Vec::new(),
            sort: None,
        }
    }

    pub fn filter(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Adds the criterion only when present; the usual shape for optional
    /// operation parameters
    pub fn filter_opt(self, criterion: Option<Criterion>) -> Self {
        match criterion {
            Some(c) => self.filter(c),
            None => self,
        }
    }

    pub fn sort_by(mut self, spec: SortSpec) -> Self {
        self.sort = Some(spec);
        self
    }
}

/// Executes queries against a borrowed record store
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor<'s> {
    store: &'s RecordStore,
    metrics: Option<&'s MetricsRegistry>,
}

impl<'s> QueryExecutor<'s> {
    pub fn new(store: &'s RecordStore) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Counts scanned records into `metrics`
    pub fn with_metrics(mut self, metrics: &'s MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn store(&self) -> &'s RecordStore {
        self.store
    }

    pub fn joins(&self) -> JoinResolver<'s> {
        JoinResolver::new(self.store)
    }

    /// Executes a query.
    ///
    /// Deterministic: same query and same store give the same records in the
    /// same order.
    pub fn execute(&self, query: &Query) -> ExecutorResult<QueryResult<'s>> {
        let collection = self.store.get(&query.collection)?;
        let criteria = effective_criteria(collection.schema(), &query.criteria);

        if let Some(spec) = &query.sort {
            if let Some(undeclared) = spec.key.paths().into_iter().find(|p| !collection.schema().declares(p)) {
                return Err(ExecutorError::InvalidSortKey {
                    collection: query.collection.clone(),
                    field: undeclared.to_string(),
                });
            }
        }

        let mut records: Vec<_> = collection
            .iter()
            .filter(|record| PredicateFilter::matches(record, &criteria))
            .collect();

        if let Some(spec) = &query.sort {
            ResultSorter::sort(&mut records, spec);
        }

        if let Some(metrics) = self.metrics {
            metrics.add_records_scanned(collection.len() as u64);
        }

        Ok(QueryResult {
            records,
            scanned: collection.len(),
        })
    }

    /// Whole collection in insertion order
    pub fn all(&self, collection: &str) -> ExecutorResult<QueryResult<'s>> {
        self.execute(&Query::new(collection))
    }
}

/// Criteria restricted to declared fields.
///
/// A multi-field criterion loses only its undeclared fields; a criterion
/// left with no fields is dropped entirely.
fn effective_criteria(schema: &CollectionSchema, criteria: &[Criterion]) -> Vec<Criterion> {
    criteria
        .iter()
        .filter_map(|criterion| {
            let (declared, ignored): (Vec<&String>, Vec<&String>) =
                criterion.fields.iter().partition(|f| schema.declares(f));

            for field in ignored {
                log_event_with_fields(
                    Event::CriterionIgnored,
                    &[("collection", schema.name.as_str()), ("field", field.as_str())],
                );
            }

            if declared.is_empty() {
                None
            } else {
                Some(Criterion {
                    fields: declared.into_iter().cloned().collect(),
                    matcher: criterion.matcher.clone(),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Matcher, SortKey};
    use crate::schema::SchemaLoader;
    use serde_json::json;

    fn store() -> RecordStore {
        let schema = SchemaLoader::parse(
            "test",
            r#"{
                "domain": "crm",
                "collections": [
                    { "name": "customers", "label": ["name"], "fields": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "tier": { "type": "string" },
                        "revenue": { "type": "number" }
                    }}
                ]
            }"#,
        )
        .unwrap();

        RecordStore::load(
            schema,
            json!({
                "customers": [
                    {"id": "cust_001", "name": "Acme Corporation", "tier": "enterprise", "revenue": 250000},
                    {"id": "cust_002", "name": "Brightside", "tier": "growth", "revenue": 45000},
                    {"id": "cust_003", "name": "Cobalt", "tier": "enterprise", "revenue": 410000},
                    {"id": "cust_004", "name": "Dune", "tier": "starter", "revenue": null}
                ]
            }),
        )
        .unwrap()
    }

    fn ids<'a>(result: &'a QueryResult<'a>) -> Vec<&'a str> {
        result.iter().filter_map(|r| r.id()).collect()
    }

    #[test]
    fn test_no_criteria_returns_collection_in_order() {
        let store = store();
        let result = QueryExecutor::new(&store).all("customers").unwrap();
        assert_eq!(ids(&result), vec!["cust_001", "cust_002", "cust_003", "cust_004"]);
        assert_eq!(result.scanned, 4);
    }

    #[test]
    fn test_filter_keeps_relative_order() {
        let store = store();
        let query = Query::new("customers").filter(Criterion::exact("tier", "enterprise"));
        let result = QueryExecutor::new(&store).execute(&query).unwrap();
        assert_eq!(ids(&result), vec!["cust_001", "cust_003"]);
    }

    #[test]
    fn test_filter_then_sort() {
        let store = store();
        let query = Query::new("customers")
            .filter(Criterion::at_least("revenue", 45000.0))
            .sort_by(SortSpec::desc(SortKey::field("revenue")));
        let result = QueryExecutor::new(&store).execute(&query).unwrap();
        assert_eq!(ids(&result), vec!["cust_003", "cust_001", "cust_002"]);
    }

    #[test]
    fn test_unknown_field_criterion_is_ignored() {
        let store = store();
        let query = Query::new("customers").filter(Criterion::exact("region", "emea"));
        let result = QueryExecutor::new(&store).execute(&query).unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_multi_field_criterion_drops_only_unknown_fields() {
        let store = store();
        let query = Query::new("customers").filter(Criterion::any_of(
            &["name", "nickname"],
            Matcher::Substring("bright".into()),
        ));
        let result = QueryExecutor::new(&store).execute(&query).unwrap();
        assert_eq!(ids(&result), vec!["cust_002"]);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let store = store();
        let query = Query::new("customers").filter(Criterion::substring("name", "zzz"));
        let result = QueryExecutor::new(&store).execute(&query).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_unknown_collection_fails() {
        let store = store();
        let err = QueryExecutor::new(&store).all("invoices").unwrap_err();
        assert_eq!(err.code(), "ORG_INVALID_COLLECTION");
    }

    #[test]
    fn test_sort_on_undeclared_field_fails() {
        let store = store();
        let query = Query::new("customers").sort_by(SortSpec::asc(SortKey::field("score")));
        let err = QueryExecutor::new(&store).execute(&query).unwrap_err();
        assert_eq!(err.code(), "ORG_INVALID_SORT_KEY");
    }

    #[test]
    fn test_scanned_records_counted() {
        let store = store();
        let metrics = MetricsRegistry::new();
        let executor = QueryExecutor::new(&store).with_metrics(&metrics);
        executor.all("customers").unwrap();
        executor.all("customers").unwrap();
        assert_eq!(metrics.snapshot().records_scanned, 8);
    }

    #[test]
    fn test_filter_opt() {
        let query = Query::new("customers")
            .filter_opt(None)
            .filter_opt(Some(Criterion::exact("tier", "growth")));
        assert_eq!(query.criteria.len(), 1);
    }
}
