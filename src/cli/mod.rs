//! CLI module for orgquery
//!
//! Provides command-line interface for:
//! - serve: Load a domain and answer JSON-RPC on stdio
//! - call: One-shot operation
//! - list: Operation and view catalogs
//! - view: One summary view

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Target};
pub use commands::{call, list, run, run_command, serve, view};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_json, write_response};
