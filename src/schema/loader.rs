//! Domain schema loading
//!
//! A domain schema is read once at startup, either from the artifact
//! embedded in the binary or from `<data_dir>/<domain>/schema.json`.
//! Malformed or inconsistent schemas abort startup.

use std::fs;
use std::path::Path;

use super::errors::{SchemaError, SchemaResult};
use super::types::DomainSchema;

/// Reads and validates domain schemas.
pub struct SchemaLoader;

impl SchemaLoader {
    /// Parses a schema from JSON text. `source_name` is used in errors.
    pub fn parse(source_name: &str, content: &str) -> SchemaResult<DomainSchema> {
        let schema: DomainSchema = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed(source_name, format!("Invalid JSON: {}", e)))?;

        schema
            .validate_structure()
            .map_err(|e| SchemaError::invalid(source_name, e))?;

        Ok(schema)
    }

    /// Reads a schema file from disk.
    pub fn from_path(path: &Path) -> SchemaResult<DomainSchema> {
        let content = fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::parse(&path.display().to_string(), &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const VALID: &str = r#"{
        "domain": "crm",
        "collections": [
            {
                "name": "customers",
                "label": ["name"],
                "fields": {
                    "id": { "type": "string" },
                    "name": { "type": "string" },
                    "tier": { "type": "enum", "values": ["enterprise", "growth"] }
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_inline() {
        let schema = SchemaLoader::parse("inline", VALID).unwrap();
        assert_eq!(schema.domain, "crm");
        assert!(schema.collection("customers").is_some());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = SchemaLoader::parse("inline", "{ not json").unwrap_err();
        assert_eq!(err.code(), "ORG_SCHEMA_MALFORMED");
    }

    #[test]
    fn test_dangling_reference_target_is_invalid() {
        let content = r#"{
            "domain": "x",
            "collections": [
                {
                    "name": "orders",
                    "fields": {
                        "id": { "type": "string" },
                        "customerId": { "type": "reference", "collection": "customers" }
                    }
                }
            ]
        }"#;
        let err = SchemaLoader::parse("inline", content).unwrap_err();
        assert_eq!(err.code(), "ORG_SCHEMA_INVALID");
    }

    #[test]
    fn test_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schema.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let schema = SchemaLoader::from_path(&path).unwrap();
        assert_eq!(schema.collections.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = SchemaLoader::from_path(&temp_dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), "ORG_SCHEMA_IO");
    }

    #[test]
    fn test_embedded_artifacts_are_valid() {
        for (name, content) in [
            ("hrm", include_str!("../../data/hrm/schema.json")),
            ("engineering", include_str!("../../data/engineering/schema.json")),
            ("crm", include_str!("../../data/crm/schema.json")),
        ] {
            let schema = SchemaLoader::parse(name, content).unwrap();
            assert_eq!(schema.domain, name);
        }
    }
}
