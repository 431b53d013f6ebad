//! Domain Scenario Tests
//!
//! End-to-end operations through the dispatcher:
//! - Embedded datasets answer the documented lookups
//! - Dangling references degrade to labels, never to failures
//! - Datasets loaded from a data directory replace the embedded ones
//! - Every failure is a structured response

use std::fs;
use std::path::Path;

use orgquery::api::{Dispatcher, Response};
use orgquery::domains::{load_store, DomainKind};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn embedded(kind: DomainKind) -> Dispatcher {
    Dispatcher::new(kind, load_store(kind, None).unwrap())
}

/// Writes `<dir>/<domain>/schema.json` from the bundled schema plus the
/// given records, and loads a dispatcher over it.
fn from_records(dir: &TempDir, kind: DomainKind, records: Value) -> Dispatcher {
    let bundled = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join(kind.as_str())
        .join("schema.json");
    let base = dir.path().join(kind.as_str());
    fs::create_dir_all(&base).unwrap();
    fs::copy(bundled, base.join("schema.json")).unwrap();
    fs::write(base.join("records.json"), records.to_string()).unwrap();

    Dispatcher::new(kind, load_store(kind, Some(dir.path())).unwrap())
}

fn data(response: Response) -> Value {
    match response {
        Response::Success { data } => data,
        Response::Failure { code, message } => panic!("{}: {}", code, message),
    }
}

fn failure_code(response: Response) -> String {
    match response {
        Response::Failure { code, .. } => code,
        Response::Success { data } => panic!("expected failure, got {}", data),
    }
}

// =============================================================================
// Embedded Datasets
// =============================================================================

/// Searching by tier returns exactly the enterprise customers.
#[test]
fn test_enterprise_customers() {
    let d = embedded(DomainKind::Crm);
    let result = data(d.call("search_customers", &json!({"tier": "enterprise"})));

    assert_eq!(result["total"], 2);
    let tiers: Vec<_> = result["customers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["tier"].as_str().unwrap())
        .collect();
    assert_eq!(tiers, vec!["enterprise", "enterprise"]);
}

/// A department whose manager id matches nobody still answers.
#[test]
fn test_department_with_dangling_manager() {
    let d = embedded(DomainKind::Hrm);
    let result = data(d.call("get_department_info", &json!({"departmentId": "dept_003"})));

    assert_eq!(result["manager"], "not assigned");
    assert_eq!(result["department"]["name"], "Sales");
    assert_eq!(result["members"]["declared"], 2);
}

/// Unknown tier values are rejected before any record is read.
#[test]
fn test_invalid_enum_argument() {
    let d = embedded(DomainKind::Crm);
    let code = failure_code(d.call("search_customers", &json!({"tier": "platinum"})));
    assert_eq!(code, "ORG_INVALID_ARGUMENT");
    assert_eq!(d.metrics().operations_failed, 1);
}

/// Out-of-range window lengths are answered, never a crash.
#[test]
fn test_window_length_bounds() {
    let d = embedded(DomainKind::Hrm);

    let everything = data(d.call("deployment_dashboard", &json!({"days": 1_000_000_000i64})));
    assert_eq!(everything["total"], 3);

    let code = failure_code(d.call("deployment_dashboard", &json!({"days": i64::MAX})));
    assert_eq!(code, "ORG_INVALID_ARGUMENT");
    let code = failure_code(d.call("deployment_dashboard", &json!({"days": u64::MAX})));
    assert_eq!(code, "ORG_INVALID_ARGUMENT");
    assert_eq!(d.metrics().operations_failed, 2);

    let e = embedded(DomainKind::Engineering);
    let code = failure_code(e.call("incident_analysis", &json!({"timeframe": format!("{}d", i64::MAX)})));
    assert_eq!(code, "ORG_INVALID_ARGUMENT");
}

/// Operations of another domain are unknown here.
#[test]
fn test_operation_from_other_domain() {
    let d = embedded(DomainKind::Engineering);
    let code = failure_code(d.call("search_customers", &json!({})));
    assert_eq!(code, "ORG_UNKNOWN_OPERATION");
}

/// Every listed view can be read.
#[test]
fn test_every_view_reads() {
    for kind in [DomainKind::Hrm, DomainKind::Engineering, DomainKind::Crm] {
        let d = embedded(kind);
        for view in d.views() {
            let value = d.read_view(view.uri).unwrap();
            assert!(value.is_object(), "{}", view.uri);
        }
    }
}

// =============================================================================
// Loaded Datasets
// =============================================================================

/// Salary groups are averaged and ranked highest first.
#[test]
fn test_salary_groups_from_data_dir() {
    let dir = TempDir::new().unwrap();
    let d = from_records(
        &dir,
        DomainKind::Hrm,
        json!({
            "employees": [
                { "id": "e1", "firstName": "Ada", "lastName": "One", "department": "B", "salary": 80000 },
                { "id": "e2", "firstName": "Bo", "lastName": "Two", "department": "A", "salary": 100000 },
                { "id": "e3", "firstName": "Cy", "lastName": "Three", "department": "A", "salary": 120000 }
            ]
        }),
    );

    let result = data(d.call("get_salary_analysis", &json!({"groupBy": "department"})));
    let groups = result["groups"].as_array().unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["group"], "A");
    assert_eq!(groups[0]["count"], 2);
    assert_eq!(groups[0]["averageSalary"], 110000);
    assert_eq!(groups[1]["group"], "B");
    assert_eq!(groups[1]["averageSalary"], 80000);
    assert_eq!(result["totalPayroll"], 300000);
}

/// MTTR comes from timestamps and skips incidents that never resolved.
#[test]
fn test_mttr_excludes_open_incidents() {
    let dir = TempDir::new().unwrap();
    let d = from_records(
        &dir,
        DomainKind::Engineering,
        json!({
            "incidents": [
                { "id": "i1", "title": "Queue backlog", "severity": "SEV2", "status": "Resolved",
                  "created_at": "2024-01-01T10:00:00Z", "resolved_at": "2024-01-01T11:00:00Z", "mttr": 999 },
                { "id": "i2", "title": "Cache stampede", "severity": "SEV1", "status": "Post-mortem",
                  "created_at": "2024-01-01T12:00:00Z", "resolved_at": "2024-01-01T14:00:00Z" },
                { "id": "i3", "title": "Disk pressure", "severity": "SEV3", "status": "Open",
                  "created_at": "2024-01-01T13:00:00Z" }
            ]
        }),
    );

    let result = data(d.call("incident_analysis", &json!({})));
    assert_eq!(result["total"], 3);
    assert_eq!(result["resolved"], 2);
    assert_eq!(result["mttrMinutes"], 90);
    assert_eq!(result["unresolvedExcluded"], 1);
}

/// An empty collection yields zero totals and "n/a" rates.
#[test]
fn test_empty_collections_answer() {
    let dir = TempDir::new().unwrap();
    let d = from_records(&dir, DomainKind::Crm, json!({}));

    let tickets = data(d.call("support_ticket_analysis", &json!({})));
    assert_eq!(tickets["total"], 0);
    assert_eq!(tickets["resolutionRate"], "n/a");

    let summary = d.read_view("crm://summary").unwrap();
    assert_eq!(summary["totalCustomers"], 0);
}

/// A dataset whose schema names another domain is refused at load.
#[test]
fn test_domain_mismatch_refused() {
    let dir = TempDir::new().unwrap();
    let bundled = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/crm/schema.json");
    let base = dir.path().join("hrm");
    fs::create_dir_all(&base).unwrap();
    fs::copy(bundled, base.join("schema.json")).unwrap();
    fs::write(base.join("records.json"), "{}").unwrap();

    let err = load_store(DomainKind::Hrm, Some(dir.path())).unwrap_err();
    assert!(err.to_string().contains("crm"));
}
