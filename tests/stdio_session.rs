//! Stdio Session Tests
//!
//! A whole JSON-RPC session driven through `Server::serve`:
//! - One response line per request, none for notifications
//! - Malformed lines are answered and the session continues
//! - End of input ends the session cleanly

use std::io::Cursor;

use orgquery::api::Dispatcher;
use orgquery::domains::{load_store, DomainKind};
use orgquery::server::Server;
use serde_json::{json, Value};

fn run_session(kind: DomainKind, requests: &[Value], raw: &[&str]) -> (Dispatcher, Vec<Value>) {
    let dispatcher = Dispatcher::new(kind, load_store(kind, None).unwrap());

    let mut input = String::new();
    for request in requests {
        input.push_str(&request.to_string());
        input.push('\n');
    }
    for line in raw {
        input.push_str(line);
        input.push('\n');
    }

    let mut output = Vec::new();
    Server::new(&dispatcher)
        .serve(Cursor::new(input), &mut output)
        .unwrap();

    let responses = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (dispatcher, responses)
}

#[test]
fn test_full_session() {
    let (dispatcher, responses) = run_session(
        DomainKind::Engineering,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "incident_analysis", "arguments": {}}}),
            json!({"jsonrpc": "2.0", "id": 4, "method": "resources/read",
                   "params": {"uri": "engineering://org-overview"}}),
        ],
        &[],
    );

    assert_eq!(responses.len(), 4);
    let ids: Vec<_> = responses.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3), json!(4)]);

    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "engineering-server");

    let tools: Vec<_> = responses[1]["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(tools.contains(&"team_health_metrics"));
    assert!(responses[1]["result"]["tools"][0]["inputSchema"]["properties"].is_object());

    let text = responses[2]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Incident Analysis\n"));

    let contents = &responses[3]["result"]["contents"][0];
    assert_eq!(contents["uri"], "engineering://org-overview");
    assert_eq!(contents["mimeType"], "application/json");
    let overview: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
    assert!(overview.is_object());

    let metrics = dispatcher.metrics();
    assert_eq!(metrics.operations_executed, 1);
    assert_eq!(metrics.views_read, 1);
}

#[test]
fn test_bad_lines_do_not_end_session() {
    let (dispatcher, responses) = run_session(
        DomainKind::Hrm,
        &[],
        &[
            "{broken",
            "",
            r#"{"jsonrpc": "2.0", "id": 7, "method": "ping"}"#,
            r#"{"jsonrpc": "2.0", "id": 8, "method": "resources/read", "params": {"uri": "hrm://nothing"}}"#,
        ],
    );

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[1]["id"], 7);
    assert_eq!(responses[1]["result"], json!({}));
    assert_eq!(responses[2]["error"]["code"], -32602);
    assert!(dispatcher.metrics().requests_rejected >= 1);
}

/// A line that is not UTF-8 gets a parse error; the session carries on.
#[test]
fn test_invalid_encoding_does_not_end_session() {
    let dispatcher = Dispatcher::new(DomainKind::Crm, load_store(DomainKind::Crm, None).unwrap());

    let mut input = b"\xff\xfe garbage\n".to_vec();
    input.extend_from_slice(b"{\"jsonrpc\": \"2.0\", \"id\": 1, \"method\": \"ping\"}\n");
    input.extend_from_slice(&[0xc3, 0x28, b'\n']);
    input.extend_from_slice(b"{\"jsonrpc\": \"2.0\", \"id\": 2, \"method\": \"ping\"}\n");

    let mut output = Vec::new();
    Server::new(&dispatcher)
        .serve(Cursor::new(input), &mut output)
        .unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[1]["id"], 1);
    assert_eq!(responses[2]["error"]["code"], -32700);
    assert_eq!(responses[3]["id"], 2);
    assert_eq!(dispatcher.metrics().requests_rejected, 2);
}

#[test]
fn test_schema_resource_listed() {
    let (_, responses) = run_session(
        DomainKind::Crm,
        &[json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"})],
        &[],
    );

    let uris: Vec<_> = responses[0]["result"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert_eq!(uris, vec!["crm://summary", "crm://schema"]);
}
