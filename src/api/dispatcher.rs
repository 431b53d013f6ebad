//! Operation dispatcher
//!
//! Owns one domain's record store and routes named operations and view
//! reads to the domain. Every call follows the same flow:
//!
//! 1. Look the operation up in the catalog
//! 2. Validate arguments against the declared parameters, apply defaults
//! 3. Execute against the store
//! 4. Wrap the outcome in a `Response`
//!
//! Nothing panics out of `call`; every failure becomes `Response::Failure`.

use serde_json::Value;

use crate::domains::{schema_view, Domain, DomainKind};
use crate::executor::QueryExecutor;
use crate::observability::{
    log_event_with_fields, Event, MetricsRegistry, MetricsSnapshot, ObservationScope,
};
use crate::storage::RecordStore;

use super::catalog::{OperationSpec, ViewSpec};
use super::errors::{ApiError, ApiResult};
use super::response::Response;

/// Routes calls for one domain
pub struct Dispatcher {
    domain: &'static dyn Domain,
    store: RecordStore,
    metrics: MetricsRegistry,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("domain", &self.domain.kind())
            .field("store", &self.store)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(kind: DomainKind, store: RecordStore) -> Self {
        Self {
            domain: kind.handler(),
            store,
            metrics: MetricsRegistry::new(),
        }
    }

    pub fn kind(&self) -> DomainKind {
        self.domain.kind()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Operation catalog in declaration order
    pub fn operations(&self) -> Vec<OperationSpec> {
        self.domain.operations()
    }

    /// View catalog: the domain's summary views followed by its schema view
    pub fn views(&self) -> Vec<ViewSpec> {
        let mut views = self.domain.views();
        views.push(schema_view_spec(self.kind()));
        views
    }

    /// Dispatches a named operation
    pub fn call(&self, name: &str, args: &Value) -> Response {
        log_event_with_fields(
            Event::OperationReceived,
            &[("domain", self.kind().as_str()), ("operation", name)],
        );

        match self.try_call(name, args) {
            Ok(data) => {
                self.metrics.increment_operations_executed();
                log_event_with_fields(Event::OperationCompleted, &[("operation", name)]);
                Response::success(data)
            }
            Err(err) => {
                self.metrics.increment_operations_failed();
                let message = err.to_string();
                log_event_with_fields(
                    Event::OperationFailed,
                    &[("operation", name), ("code", err.code()), ("message", message.as_str())],
                );
                Response::failure(&err)
            }
        }
    }

    fn try_call(&self, name: &str, args: &Value) -> ApiResult<Value> {
        let spec = self
            .operations()
            .into_iter()
            .find(|op| op.name == name)
            .ok_or_else(|| ApiError::UnknownOperation(name.to_string()))?;
        let validated = spec.validate(args)?;

        let scope = ObservationScope::with_fields(
            "EXECUTE",
            vec![("domain", self.kind().as_str().to_string()), ("operation", name.to_string())],
        );
        let executor = QueryExecutor::new(&self.store).with_metrics(&self.metrics);
        match self.domain.execute(&executor, name, validated) {
            Ok(data) => {
                scope.complete();
                Ok(data)
            }
            Err(err) => {
                scope.fail(err.code(), &err.to_string());
                Err(err)
            }
        }
    }

    /// Reads a summary view, recomputed from the full store
    pub fn read_view(&self, uri: &str) -> ApiResult<Value> {
        log_event_with_fields(Event::ViewRead, &[("uri", uri)]);
        let executor = QueryExecutor::new(&self.store).with_metrics(&self.metrics);
        let view = if uri == self.kind().schema_uri() {
            Ok(schema_view(&self.store))
        } else {
            self.domain.read_view(&executor, uri)
        };
        if view.is_ok() {
            self.metrics.increment_views_read();
        }
        view
    }

    /// Counts a request the transport refused before it reached the domain
    pub fn record_rejection(&self) {
        self.metrics.increment_requests_rejected();
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn schema_view_spec(kind: DomainKind) -> ViewSpec {
    let uri = match kind {
        DomainKind::Hrm => "hrm://schema",
        DomainKind::Engineering => "engineering://schema",
        DomainKind::Crm => "crm://schema",
    };
    ViewSpec::new(uri, "Schema", "Declared collections, fields and references with record counts")
}
