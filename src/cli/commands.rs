//! CLI command implementations
//!
//! Every command boots the same way:
//! 1. Configuration resolved (file, then flags, then validation)
//! 2. Log severity applied
//! 3. Record store loaded for the configured domain
//! 4. Dispatcher built over the store

use std::io;

use serde_json::{json, Value};

use crate::api::{Dispatcher, Response};
use crate::config::ServerConfig;
use crate::domains::load_store;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::server::Server;

use super::args::{Command, Target};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_json, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { target } => serve(&target),
        Command::Call {
            target,
            operation,
            args,
        } => call(&target, &operation, args.as_deref()),
        Command::List { target } => list(&target),
        Command::View { target, uri } => view(&target, &uri),
    }
}

/// Serve JSON-RPC on stdin/stdout until end of input
pub fn serve(target: &Target) -> CliResult<()> {
    let dispatcher = boot(target)?;
    log_event_with_fields(Event::Serving, &[("domain", dispatcher.kind().as_str())]);

    let stdin = io::stdin();
    let stdout = io::stdout();
    Server::new(&dispatcher).serve(stdin.lock(), stdout.lock())?;

    let fields = dispatcher.metrics().fields();
    let refs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
    log_event_with_fields(Event::ShutdownComplete, &refs);
    Ok(())
}

/// Execute a single operation and exit
pub fn call(target: &Target, operation: &str, args: Option<&str>) -> CliResult<()> {
    let args: Value = match args {
        Some(text) => serde_json::from_str(text).map_err(CliError::InvalidArgs)?,
        None => json!({}),
    };

    let dispatcher = boot(target)?;
    let response = dispatcher.call(operation, &args);
    write_json(&response.to_json())?;

    match response {
        Response::Success { .. } => Ok(()),
        Response::Failure { code, .. } => Err(CliError::RequestFailed { code }),
    }
}

/// Print the operation and view catalogs
pub fn list(target: &Target) -> CliResult<()> {
    let dispatcher = boot(target)?;
    let operations: Vec<Value> = dispatcher.operations().iter().map(|op| op.describe()).collect();

    write_response(json!({
        "domain": dispatcher.kind(),
        "operations": operations,
        "views": dispatcher.views(),
    }))
}

/// Print one summary view
pub fn view(target: &Target, uri: &str) -> CliResult<()> {
    let dispatcher = boot(target)?;
    match dispatcher.read_view(uri) {
        Ok(data) => write_response(data),
        Err(err) => {
            write_error(err.code(), &err.to_string())?;
            Err(CliError::RequestFailed {
                code: err.code().to_string(),
            })
        }
    }
}

fn boot(target: &Target) -> CliResult<Dispatcher> {
    log_event(Event::BootStart);
    match try_boot(target) {
        Ok(dispatcher) => Ok(dispatcher),
        Err(err) => {
            let reason = err.to_string();
            log_event_with_fields(Event::BootFailed, &[("code", err.code()), ("reason", reason.as_str())]);
            Err(err)
        }
    }
}

fn try_boot(target: &Target) -> CliResult<Dispatcher> {
    let config = ServerConfig::resolve(target.config.as_deref(), target.overrides())?;
    Logger::set_min_severity(config.severity());

    let kind = config.domain()?;
    let source = config
        .data_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "embedded".to_string());
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("domain", kind.as_str()),
            ("data_dir", source.as_str()),
            ("log_level", config.log_level.as_str()),
        ],
    );

    let store = load_store(kind, config.data_dir())?;
    let collections = store.collections().count().to_string();
    let records = store.total_records().to_string();
    log_event_with_fields(
        Event::StoreLoaded,
        &[
            ("domain", kind.as_str()),
            ("collections", collections.as_str()),
            ("records", records.as_str()),
        ],
    );

    Ok(Dispatcher::new(kind, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::DomainKind;

    fn target(domain: Option<DomainKind>) -> Target {
        Target {
            domain,
            ..Target::default()
        }
    }

    #[test]
    fn test_boot_embedded_domain() {
        let dispatcher = boot(&target(Some(DomainKind::Hrm))).unwrap();
        assert_eq!(dispatcher.kind(), DomainKind::Hrm);
        assert!(dispatcher.store().total_records() > 0);
    }

    #[test]
    fn test_boot_without_domain_fails() {
        let err = boot(&target(None)).unwrap_err();
        assert_eq!(err.code(), "ORG_CONFIG_MISSING_DOMAIN");
    }

    #[test]
    fn test_call_rejects_bad_args_before_boot() {
        let err = call(&target(None), "search_customers", Some("{nope")).unwrap_err();
        assert_eq!(err.code(), "ORG_CLI_INVALID_ARGS");
    }
}
