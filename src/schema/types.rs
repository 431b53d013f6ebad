//! Schema type definitions
//!
//! Supported field types:
//! - string: UTF-8 string
//! - number: integer or float
//! - bool: Boolean
//! - enum: string drawn from a declared value list
//! - date / timestamp: `YYYY-MM-DD` / RFC 3339 strings
//! - object: nested object with field schema
//! - string_list: list of strings
//! - reference / reference_list: foreign key(s) into another collection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_key() -> String {
    "id".to_string()
}

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// Integer or floating point number
    Number,
    /// Boolean
    Bool,
    /// Enumerated string. Values outside the list pass through unchanged.
    Enum {
        /// Declared legal values
        values: Vec<String>,
    },
    /// Calendar date (`YYYY-MM-DD`)
    Date,
    /// RFC 3339 timestamp
    Timestamp,
    /// Nested object with its own field schema
    Object {
        /// Nested field definitions
        fields: BTreeMap<String, FieldDef>,
    },
    /// List of strings
    StringList,
    /// Foreign key into `collection`, matched against `key`
    Reference {
        collection: String,
        #[serde(default = "default_key")]
        key: String,
    },
    /// List of foreign keys into `collection`, matched against `key`
    ReferenceList {
        collection: String,
        #[serde(default = "default_key")]
        key: String,
    },
}

impl FieldType {
    /// Returns the type name for error messages and the schema view
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Enum { .. } => "enum",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
            FieldType::Object { .. } => "object",
            FieldType::StringList => "string_list",
            FieldType::Reference { .. } => "reference",
            FieldType::ReferenceList { .. } => "reference_list",
        }
    }

    /// Returns the (collection, key) target for reference types
    pub fn reference_target(&self) -> Option<(&str, &str)> {
        match self {
            FieldType::Reference { collection, key }
            | FieldType::ReferenceList { collection, key } => Some((collection, key)),
            _ => None,
        }
    }

    /// Returns true for list-valued types
    pub fn is_list(&self) -> bool {
        matches!(self, FieldType::StringList | FieldType::ReferenceList { .. })
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDef {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn enumeration(values: &[&str]) -> Self {
        Self::new(FieldType::Enum {
            values: values.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn string_list() -> Self {
        Self::new(FieldType::StringList)
    }

    pub fn reference(collection: &str) -> Self {
        Self::new(FieldType::Reference {
            collection: collection.to_string(),
            key: default_key(),
        })
    }

    pub fn reference_list(collection: &str) -> Self {
        Self::new(FieldType::ReferenceList {
            collection: collection.to_string(),
            key: default_key(),
        })
    }
}

/// Schema for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection name
    pub name: String,
    /// Fields joined with a space to form a record's display label
    #[serde(default)]
    pub label: Vec<String>,
    /// Field definitions
    pub fields: BTreeMap<String, FieldDef>,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>, fields: BTreeMap<String, FieldDef>) -> Self {
        Self {
            name: name.into(),
            label: Vec::new(),
            fields,
        }
    }

    pub fn with_label(mut self, label: &[&str]) -> Self {
        self.label = label.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Looks up a field, following dotted paths into nested objects
    pub fn field(&self, path: &str) -> Option<&FieldDef> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            match &current.field_type {
                FieldType::Object { fields } => current = fields.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Returns true if the (possibly dotted) field is declared
    pub fn declares(&self, path: &str) -> bool {
        self.field(path).is_some()
    }
}

/// A complete domain schema: every collection of one server instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSchema {
    /// Domain identifier (`hrm`, `engineering`, `crm`)
    pub domain: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Collections in declaration order
    pub collections: Vec<CollectionSchema>,
}

impl DomainSchema {
    pub fn new(domain: impl Into<String>, collections: Vec<CollectionSchema>) -> Self {
        Self {
            domain: domain.into(),
            description: None,
            collections,
        }
    }

    /// Gets a collection schema by name
    pub fn collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Validates the schema structure itself (not any record)
    pub fn validate_structure(&self) -> Result<(), String> {
        for (i, collection) in self.collections.iter().enumerate() {
            if self.collections[..i].iter().any(|c| c.name == collection.name) {
                return Err(format!("collection '{}' declared twice", collection.name));
            }

            if !collection.fields.contains_key("id") {
                return Err(format!(
                    "collection '{}' must declare an 'id' field",
                    collection.name
                ));
            }

            for label in &collection.label {
                if !collection.declares(label) {
                    return Err(format!(
                        "collection '{}' labels undeclared field '{}'",
                        collection.name, label
                    ));
                }
            }

            for (field, def) in &collection.fields {
                if let Some((target, key)) = def.field_type.reference_target() {
                    let target_schema = self.collection(target).ok_or_else(|| {
                        format!(
                            "field '{}.{}' references undeclared collection '{}'",
                            collection.name, field, target
                        )
                    })?;
                    if !target_schema.declares(key) {
                        return Err(format!(
                            "field '{}.{}' references undeclared key '{}.{}'",
                            collection.name, field, target, key
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> DomainSchema {
        let mut employees = BTreeMap::new();
        employees.insert("id".into(), FieldDef::string());
        employees.insert("name".into(), FieldDef::string());
        employees.insert("manager".into(), FieldDef::reference("employees"));
        employees.insert("department".into(), FieldDef::reference("departments"));

        let mut departments = BTreeMap::new();
        departments.insert("id".into(), FieldDef::string());
        departments.insert("members".into(), FieldDef::reference_list("employees"));

        DomainSchema::new(
            "hrm",
            vec![
                CollectionSchema::new("employees", employees).with_label(&["name"]),
                CollectionSchema::new("departments", departments),
            ],
        )
    }

    #[test]
    fn test_schema_structure_valid() {
        assert!(sample_schema().validate_structure().is_ok());
    }

    #[test]
    fn test_collection_missing_id_field() {
        let mut fields = BTreeMap::new();
        fields.insert("name".into(), FieldDef::string());
        let schema = DomainSchema::new("x", vec![CollectionSchema::new("things", fields)]);

        let err = schema.validate_structure().unwrap_err();
        assert!(err.contains("'id'"));
    }

    #[test]
    fn test_reference_to_undeclared_collection() {
        let mut fields = BTreeMap::new();
        fields.insert("id".into(), FieldDef::string());
        fields.insert("team".into(), FieldDef::reference("teams"));
        let schema = DomainSchema::new("x", vec![CollectionSchema::new("engineers", fields)]);

        let err = schema.validate_structure().unwrap_err();
        assert!(err.contains("teams"));
    }

    #[test]
    fn test_duplicate_collection_rejected() {
        let mut fields = BTreeMap::new();
        fields.insert("id".into(), FieldDef::string());
        let schema = DomainSchema::new(
            "x",
            vec![
                CollectionSchema::new("a", fields.clone()),
                CollectionSchema::new("a", fields),
            ],
        );
        assert!(schema.validate_structure().is_err());
    }

    #[test]
    fn test_dotted_field_lookup() {
        let mut vulns = BTreeMap::new();
        vulns.insert("critical".into(), FieldDef::number());

        let mut fields = BTreeMap::new();
        fields.insert("id".into(), FieldDef::string());
        fields.insert(
            "securityVulns".into(),
            FieldDef::new(FieldType::Object { fields: vulns }),
        );
        let repo = CollectionSchema::new("repositories", fields);

        assert!(repo.declares("securityVulns.critical"));
        assert!(!repo.declares("securityVulns.unknown"));
        assert!(!repo.declares("id.nested"));
    }

    #[test]
    fn test_deserialize_reference_default_key() {
        let def: FieldDef =
            serde_json::from_str(r#"{"type": "reference", "collection": "employees"}"#).unwrap();
        assert_eq!(def.field_type.reference_target(), Some(("employees", "id")));

        let def: FieldDef = serde_json::from_str(
            r#"{"type": "reference_list", "collection": "teams", "key": "name"}"#,
        )
        .unwrap();
        assert_eq!(def.field_type.reference_target(), Some(("teams", "name")));
        assert!(def.field_type.is_list());
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldType::Number.type_name(), "number");
        assert_eq!(FieldType::StringList.type_name(), "string_list");
        assert_eq!(
            FieldType::Enum { values: vec![] }.type_name(),
            "enum"
        );
    }
}
