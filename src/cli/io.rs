//! JSON output for one-shot commands
//!
//! - One JSON object per invocation on stdout
//! - `{"status": "ok", "data": ...}` or `{"status": "error", "code", "message"}`

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;
use crate::api::Response;

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_json(&Response::success(data).to_json())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = Response::Failure {
        code: code.to_string(),
        message: message.to_string(),
    };
    write_json(&response.to_json())
}

/// Write a raw JSON string to stdout
pub fn write_json(json_str: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", json_str)?;
    stdout.flush()?;

    Ok(())
}
