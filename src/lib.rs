//! orgquery - A deterministic query and aggregation engine over static
//! organizational data
//!
//! One process serves one domain (hrm, engineering or crm). Records are
//! loaded once at boot, validated against the domain schema and never
//! mutated afterwards.

pub mod aggregate;
pub mod api;
pub mod cli;
pub mod config;
pub mod domains;
pub mod executor;
pub mod join;
pub mod observability;
pub mod render;
pub mod schema;
pub mod server;
pub mod storage;
