//! Domain instantiations of the engine
//!
//! A domain is a schema artifact, a records artifact and a catalog of
//! operations and views written against the generic core. The three
//! domains share every line of query, join and aggregation code; only the
//! operation bodies differ.

mod activity;
mod common;
mod crm;
mod engineering;
mod errors;
mod hrm;

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{ApiResult, OperationSpec, ViewSpec};
use crate::executor::QueryExecutor;
use crate::schema::SchemaLoader;
use crate::storage::RecordStore;

pub use common::schema_view;
pub use errors::{DomainError, DomainResult};

/// The deployable domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DomainKind {
    Hrm,
    Engineering,
    Crm,
}

impl DomainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::Hrm => "hrm",
            DomainKind::Engineering => "engineering",
            DomainKind::Crm => "crm",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hrm" => Some(DomainKind::Hrm),
            "engineering" => Some(DomainKind::Engineering),
            "crm" => Some(DomainKind::Crm),
            _ => None,
        }
    }

    /// Server name advertised on `initialize`
    pub fn server_name(&self) -> &'static str {
        match self {
            DomainKind::Hrm => "hrm-server",
            DomainKind::Engineering => "engineering-server",
            DomainKind::Crm => "crm-server",
        }
    }

    /// URI of the schema view
    pub fn schema_uri(&self) -> String {
        format!("{}://schema", self.as_str())
    }

    pub fn handler(&self) -> &'static dyn Domain {
        match self {
            DomainKind::Hrm => &hrm::Hrm,
            DomainKind::Engineering => &engineering::Engineering,
            DomainKind::Crm => &crm::Crm,
        }
    }

    fn embedded_schema(&self) -> &'static str {
        match self {
            DomainKind::Hrm => include_str!("../../data/hrm/schema.json"),
            DomainKind::Engineering => include_str!("../../data/engineering/schema.json"),
            DomainKind::Crm => include_str!("../../data/crm/schema.json"),
        }
    }

    fn embedded_records(&self) -> &'static str {
        match self {
            DomainKind::Hrm => include_str!("../../data/hrm/records.json"),
            DomainKind::Engineering => include_str!("../../data/engineering/records.json"),
            DomainKind::Crm => include_str!("../../data/crm/records.json"),
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations and views of one domain.
///
/// Arguments reaching `execute` have already been validated against the
/// operation's declared parameters, with defaults applied.
pub trait Domain: Sync {
    fn kind(&self) -> DomainKind;

    fn operations(&self) -> Vec<OperationSpec>;

    /// Summary views, excluding the schema view every domain serves
    fn views(&self) -> Vec<ViewSpec>;

    fn execute(
        &self,
        executor: &QueryExecutor<'_>,
        operation: &str,
        args: Map<String, Value>,
    ) -> ApiResult<Value>;

    fn read_view(&self, executor: &QueryExecutor<'_>, uri: &str) -> ApiResult<Value>;
}

/// Builds the record store of a domain.
///
/// Without `data_dir` the artifacts compiled into the binary are used;
/// otherwise `<data_dir>/<domain>/schema.json` and `records.json`.
pub fn load_store(kind: DomainKind, data_dir: Option<&Path>) -> DomainResult<RecordStore> {
    let (schema, records) = match data_dir {
        Some(dir) => {
            let base = dir.join(kind.as_str());
            let schema = SchemaLoader::from_path(&base.join("schema.json"))?;
            let records_path = base.join("records.json");
            let content = std::fs::read_to_string(&records_path).map_err(|source| DomainError::Io {
                path: records_path.display().to_string(),
                source,
            })?;
            (schema, parse_records(&records_path.display().to_string(), &content)?)
        }
        None => {
            let source_name = format!("embedded:{}", kind);
            let schema = SchemaLoader::parse(&source_name, kind.embedded_schema())?;
            (schema, parse_records(&source_name, kind.embedded_records())?)
        }
    };

    if schema.domain != kind.as_str() {
        return Err(DomainError::DomainMismatch {
            expected: kind.as_str().to_string(),
            found: schema.domain.clone(),
        });
    }

    Ok(RecordStore::load(schema, records)?)
}

fn parse_records(source_name: &str, content: &str) -> DomainResult<Value> {
    serde_json::from_str(content).map_err(|source| DomainError::Malformed {
        source_name: source_name.to_string(),
        source,
    })
}
