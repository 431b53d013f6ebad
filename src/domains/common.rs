//! Helpers shared by the domain operations

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::aggregate::{round1, TimeWindow};
use crate::api::{ApiError, ApiResult};
use crate::executor::QueryExecutor;
use crate::join::{JoinResolver, Reference};
use crate::storage::{Record, RecordStore};

/// Label used when an organizational unit has no resolvable manager
pub(crate) const NOT_ASSIGNED: &str = "not assigned";

/// Label used when a principal has no manager at all
pub(crate) const NONE_LABEL: &str = "None";

/// Builds the typed call of a domain from an operation name and its
/// validated arguments
pub(crate) fn parse_call<T: DeserializeOwned>(operation: &str, args: Map<String, Value>) -> ApiResult<T> {
    serde_json::from_value(json!({ "operation": operation, "arguments": args }))
        .map_err(|e| ApiError::invalid_argument(operation, e.to_string()))
}

/// The record as JSON with extra fields appended
pub(crate) fn enriched(record: &Record, extra: Vec<(&str, Value)>) -> Value {
    let mut fields = record.fields().clone();
    for (key, value) in extra {
        fields.insert(key.to_string(), value);
    }
    Value::Object(fields)
}

/// One-decimal rounding of an optional average; `null` when absent
pub(crate) fn opt_round1(value: Option<f64>) -> Value {
    value.map(round1).map(Value::from).unwrap_or(Value::Null)
}

/// Whole-number rounding of an optional average; `null` when absent
pub(crate) fn opt_round0(value: Option<f64>) -> Value {
    value.map(|v| Value::from(v.round() as i64)).unwrap_or(Value::Null)
}

/// Length of a `24h` / `7d` / `30d` style timeframe
pub(crate) fn timeframe(text: &str) -> ApiResult<Duration> {
    let invalid = || ApiError::invalid_argument("timeframe", format!("unsupported timeframe '{}'", text));
    let Some((split, _)) = text.char_indices().last() else {
        return Err(invalid());
    };
    let (amount, unit) = text.split_at(split);
    let amount: i64 = amount.parse().map_err(|_| invalid())?;
    let length = match unit {
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => return Err(invalid()),
    };
    length.ok_or_else(invalid)
}

/// Length of a window given in whole days; positive and representable
pub(crate) fn trailing_days(param: &str, days: i64) -> ApiResult<Duration> {
    if days <= 0 {
        return Err(ApiError::invalid_argument(param, "must be positive"));
    }
    Duration::try_days(days).ok_or_else(|| ApiError::invalid_argument(param, "out of range"))
}

/// Records inside a trailing window anchored at the newest timestamp of the
/// whole collection. With no timestamps at all nothing is in the window.
pub(crate) fn within_window<'s>(
    executor: &QueryExecutor<'s>,
    collection: &str,
    records: Vec<&'s Record>,
    path: &str,
    length: Duration,
) -> ApiResult<Vec<&'s Record>> {
    let all = executor.store().get(collection)?;
    Ok(match TimeWindow::trailing(all, path, length) {
        Some(window) => records.into_iter().filter(|r| window.contains(r, path)).collect(),
        None => Vec::new(),
    })
}

/// Manager of an organizational unit: id and name when the reference
/// resolves, `"not assigned"` when it is unset or dangling
pub(crate) fn unit_manager(joins: &JoinResolver<'_>, collection: &str, record: &Record) -> ApiResult<Value> {
    let Reference::Resolved(manager) = joins.resolve(collection, record, "manager")? else {
        return Ok(json!(NOT_ASSIGNED));
    };
    let name = joins.resolve_label(collection, record, "manager", NOT_ASSIGNED)?;
    Ok(json!({ "id": manager.id(), "name": name }))
}

/// Declared count, resolved labels and dangling keys of a reference list
pub(crate) fn reference_list(
    joins: &JoinResolver<'_>,
    collection: &str,
    record: &Record,
    field: &str,
) -> ApiResult<Value> {
    let (list, labels) = joins.resolve_many_labels(collection, record, field)?;
    Ok(json!({
        "declared": list.declared,
        "resolved": labels,
        "dangling": list.dangling,
    }))
}

/// Labels of the targets of a reference list that exist
pub(crate) fn reference_labels(
    joins: &JoinResolver<'_>,
    collection: &str,
    record: &Record,
    field: &str,
) -> ApiResult<Vec<String>> {
    Ok(joins.resolve_many_labels(collection, record, field)?.1)
}

/// Looks a record up by id, then by its name field
pub(crate) fn find_by_id_or_name<'s>(
    store: &'s RecordStore,
    collection: &str,
    key: &str,
    entity: &'static str,
) -> ApiResult<&'s Record> {
    let records = store.get(collection)?;
    records
        .get_by_id(key)
        .or_else(|| records.find_by("name", key))
        .ok_or_else(|| ApiError::not_found(entity, key))
}

/// Looks a record up by id only
pub(crate) fn find_by_id<'s>(
    store: &'s RecordStore,
    collection: &str,
    id: &str,
    entity: &'static str,
) -> ApiResult<&'s Record> {
    store
        .get_by_id(collection, id)?
        .ok_or_else(|| ApiError::not_found(entity, id))
}

pub(crate) fn to_values(records: &[&Record]) -> Vec<Value> {
    records.iter().map(|r| r.to_value()).collect()
}

/// Declared schema of the store plus record counts
pub fn schema_view(store: &RecordStore) -> Value {
    let collections: Vec<Value> = store
        .collections()
        .map(|collection| {
            json!({
                "name": collection.name(),
                "records": collection.len(),
                "label": collection.schema().label,
                "fields": collection.schema().fields,
            })
        })
        .collect();

    json!({
        "domain": store.domain(),
        "description": store.schema().description,
        "totalRecords": store.total_records(),
        "collections": collections,
    })
}
