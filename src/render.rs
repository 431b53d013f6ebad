//! Plain-text rendering of structured results
//!
//! A report is a title line followed by one bullet per field. Nested
//! objects and lists indent by two spaces per level. List items that are
//! objects are headed by their `name`, `title` or `id`.

use serde_json::{Map, Value};

const HEADING_KEYS: &[&str] = &["name", "title", "id"];

/// Renders `value` as a report titled `title`
pub fn render(title: &str, value: &Value) -> String {
    let mut out = format!("{}\n", title);
    match value {
        Value::Object(_) | Value::Array(_) => write_value(&mut out, value, 0),
        scalar => push_line(&mut out, 0, &scalar_text(scalar)),
    }
    out
}

/// Title for an operation name: `get_team_info` -> `Get Team Info`
pub fn title_for(operation: &str) -> String {
    operation
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Object(fields) => write_object(out, fields, depth),
        Value::Array(items) => write_list(out, items, depth),
        scalar => push_line(out, depth, &scalar_text(scalar)),
    }
}

fn write_object(out: &mut String, fields: &Map<String, Value>, depth: usize) {
    for (key, value) in fields {
        match value {
            Value::Object(nested) if nested.is_empty() => push_line(out, depth, &format!("{}: none", key)),
            Value::Array(items) if items.is_empty() => push_line(out, depth, &format!("{}: none", key)),
            Value::Object(_) | Value::Array(_) => {
                push_line(out, depth, &format!("{}:", key));
                write_value(out, value, depth + 1);
            }
            scalar => push_line(out, depth, &format!("{}: {}", key, scalar_text(scalar))),
        }
    }
}

fn write_list(out: &mut String, items: &[Value], depth: usize) {
    for item in items {
        match item {
            Value::Object(fields) => {
                push_line(out, depth, &heading(fields));
                write_object(out, fields, depth + 1);
            }
            Value::Array(_) => write_value(out, item, depth + 1),
            scalar => push_line(out, depth, &scalar_text(scalar)),
        }
    }
}

fn heading(fields: &Map<String, Value>) -> String {
    HEADING_KEYS
        .iter()
        .find_map(|key| fields.get(*key).filter(|v| !v.is_null()))
        .map(scalar_text)
        .unwrap_or_else(|| "item".to_string())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "none".to_string(),
        other => other.to_string(),
    }
}

fn push_line(out: &mut String, depth: usize, text: &str) {
    out.push_str(&"  ".repeat(depth));
    out.push_str("• ");
    out.push_str(text);
    out.push('\n');
}
