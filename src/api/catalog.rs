//! Operation and view catalog
//!
//! Each operation declares its parameters once. The same declaration
//! renders the JSON Schema advertised to clients and validates incoming
//! arguments before any domain code runs.

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::errors::{ApiError, ApiResult};

/// Primitive parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamKind {
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

/// One declared operation parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    /// Allowed values; empty means unrestricted
    pub values: &'static [&'static str],
    pub default: Option<Value>,
    pub required: bool,
}

impl ParamSpec {
    fn new(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            values: &[],
            default: None,
            required: false,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::String, description)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::Number, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::Integer, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamKind::Boolean, description)
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.values = values;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.kind.json_type()));
        schema.insert("description".into(), json!(self.description));
        if !self.values.is_empty() {
            schema.insert("enum".into(), json!(self.values));
        }
        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }
        Value::Object(schema)
    }

    fn check(&self, value: &Value) -> ApiResult<()> {
        if !self.kind.accepts(value) {
            return Err(ApiError::invalid_argument(
                self.name,
                format!("expected {}, got {}", self.kind.json_type(), value),
            ));
        }
        if let Some(text) = value.as_str() {
            if !self.values.is_empty() && !self.values.contains(&text) {
                return Err(ApiError::invalid_argument(
                    self.name,
                    format!("'{}' is not one of [{}]", text, self.values.join(", ")),
                ));
            }
        }
        Ok(())
    }
}

/// A named, schema-described operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl OperationSpec {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// JSON Schema object for the operation's arguments
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });

        let required: Vec<&str> = self.params.iter().filter(|p| p.required).map(|p| p.name).collect();
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// Validates raw arguments and returns them normalized.
    ///
    /// - `null` or absent arguments read as `{}`
    /// - a `null` parameter reads as absent
    /// - undeclared parameters are dropped
    /// - defaults fill absent parameters
    pub fn validate(&self, args: &Value) -> ApiResult<Map<String, Value>> {
        let provided = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            other => {
                return Err(ApiError::invalid_argument(
                    "arguments",
                    format!("expected an object, got {}", other),
                ))
            }
        };

        let mut normalized = Map::new();
        for param in &self.params {
            match provided.get(param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    param.check(value)?;
                    normalized.insert(param.name.to_string(), value.clone());
                }
                None if param.required => {
                    return Err(ApiError::invalid_argument(param.name, "is required"));
                }
                None => {
                    if let Some(default) = &param.default {
                        normalized.insert(param.name.to_string(), default.clone());
                    }
                }
            }
        }
        Ok(normalized)
    }

    /// Catalog entry as advertised to clients
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

/// A read-only summary view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSpec {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

impl ViewSpec {
    pub const fn new(uri: &'static str, name: &'static str, description: &'static str) -> Self {
        Self {
            uri,
            name,
            description,
            mime_type: "application/json",
        }
    }
}
