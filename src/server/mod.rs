//! Line-delimited JSON-RPC server over stdio
//!
//! One request per input line, one response per output line. A bad line is
//! answered with an error and the loop carries on; only end of input or a
//! failed write ends it.

mod errors;
mod protocol;

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use crate::api::{Dispatcher, Response};
use crate::observability::{log_event_with_fields, Event};
use crate::render::{render, title_for};

pub use errors::{ServerError, ServerResult};
pub use protocol::{
    RpcError, RpcRequest, RpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
    PARSE_ERROR, PROTOCOL_VERSION,
};

use protocol::{ResourceRead, ToolCall};

/// Serves one dispatcher
pub struct Server<'d> {
    dispatcher: &'d Dispatcher,
}

impl<'d> Server<'d> {
    pub fn new(dispatcher: &'d Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Reads requests until end of input.
    ///
    /// Lines are read as raw bytes; a line that is not UTF-8 is answered
    /// with a parse error like any other malformed request.
    pub fn serve<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> ServerResult<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line),
                Err(e) => {
                    self.reject("parse_error", &e.to_string());
                    Some(RpcResponse::error(
                        Value::Null,
                        PARSE_ERROR,
                        format!("Parse error: input is not valid UTF-8: {}", e),
                    ))
                }
            };

            if let Some(response) = response {
                writeln!(output, "{}", response.to_json())?;
                output.flush()?;
            }
        }
    }

    /// Answers one raw input line; `None` for notifications
    pub fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                self.reject("parse_error", &e.to_string());
                return Some(RpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {}", e)));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<RpcRequest>(value) {
            Ok(request) => self.handle(request),
            Err(e) => {
                self.reject("invalid_request", &e.to_string());
                Some(RpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {}", e)))
            }
        }
    }

    /// Answers one parsed request; `None` for notifications
    pub fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        if request.is_notification() {
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(request.params),
            "resources/list" => Ok(self.list_resources()),
            "resources/read" => self.read_resource(request.params),
            other => {
                self.reject("method_not_found", other);
                Err(RpcError {
                    code: METHOD_NOT_FOUND,
                    message: format!("Method not found: {}", other),
                })
            }
        };

        Some(match outcome {
            Ok(result) => RpcResponse::result(id, result),
            Err(error) => RpcResponse::error(id, error.code, error.message),
        })
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"resources": {}, "tools": {}},
            "serverInfo": {
                "name": self.dispatcher.kind().server_name(),
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self.dispatcher.operations().iter().map(|op| op.describe()).collect();
        json!({ "tools": tools })
    }

    fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let call: ToolCall = serde_json::from_value(params).map_err(invalid_params)?;

        let (text, is_error) = match self.dispatcher.call(&call.name, &call.arguments) {
            Response::Success { data } => (render(&title_for(&call.name), &data), false),
            Response::Failure { message, .. } => (format!("Error: {}", message), true),
        };

        Ok(json!({
            "content": [{"type": "text", "text": text}],
            "isError": is_error,
        }))
    }

    fn list_resources(&self) -> Value {
        json!({ "resources": self.dispatcher.views() })
    }

    fn read_resource(&self, params: Value) -> Result<Value, RpcError> {
        let read: ResourceRead = serde_json::from_value(params).map_err(invalid_params)?;
        let view = self.dispatcher.read_view(&read.uri).map_err(|err| RpcError {
            code: INVALID_PARAMS,
            message: err.to_string(),
        })?;
        let text = serde_json::to_string_pretty(&view).map_err(|e| RpcError {
            code: INVALID_PARAMS,
            message: e.to_string(),
        })?;

        Ok(json!({
            "contents": [{
                "uri": read.uri,
                "mimeType": "application/json",
                "text": text,
            }],
        }))
    }

    fn reject(&self, reason: &str, detail: &str) {
        self.dispatcher.record_rejection();
        log_event_with_fields(Event::RequestRejected, &[("reason", reason), ("detail", detail)]);
    }
}

fn invalid_params(e: serde_json::Error) -> RpcError {
    RpcError {
        code: INVALID_PARAMS,
        message: format!("Invalid params: {}", e),
    }
}
