//! Structured response descriptor

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fingerprint;
use crate::domain::DomainError;

/// Describes the JSON shape a structured completion must conform to.
///
/// Only `schema` is structural; `name` and `description` are forwarded to
/// the completion service but do not affect the fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Name of the response shape, as sent to the completion service
    pub name: String,
    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema definition of the response
    pub schema: Value,
    /// Ask the completion service for strict schema adherence
    #[serde(default = "default_strict")]
    pub strict: bool,
}

fn default_strict() -> bool {
    true
}

impl ResponseSchema {
    /// Create a new response schema
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema,
            strict: default_strict(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse a descriptor from its JSON form
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let schema: Self = serde_json::from_str(json)
            .map_err(|e| DomainError::validation(format!("Invalid response schema: {}", e)))?;

        if !schema.schema.is_object() {
            return Err(DomainError::validation(
                "Invalid response schema: 'schema' must be a JSON object",
            ));
        }

        Ok(schema)
    }

    /// Fingerprint of the structural definition
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_does_not_affect_fingerprint() {
        let schema = json!({ "type": "object", "properties": { "answer": { "type": "string" } } });

        let a = ResponseSchema::new("answer", schema.clone());
        let b = ResponseSchema::new("reply", schema).with_description("Same shape");

        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_from_json() {
        let schema = ResponseSchema::from_json(
            r#"{"name": "capital", "schema": {"type": "object", "properties": {"city": {"type": "string"}}}}"#,
        )
        .unwrap();

        assert_eq!(schema.name, "capital");
        assert!(schema.strict);
        assert!(schema.description.is_none());
    }

    #[test]
    fn test_from_json_rejects_non_object_schema() {
        let result = ResponseSchema::from_json(r#"{"name": "bad", "schema": "string"}"#);

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(ResponseSchema::from_json("not json").is_err());
    }
}
