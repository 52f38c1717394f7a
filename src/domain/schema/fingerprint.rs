//! Schema fingerprinting

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Prefix tagging every schema fingerprint
pub const FINGERPRINT_PREFIX: &str = "schema_";

/// Number of hex characters kept from the digest
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Compute the fingerprint of a schema definition.
///
/// The digest is taken over [`canonical_json`], so key order in the input
/// does not matter. Output format: `schema_` followed by 16 lowercase hex
/// characters of the SHA-256 digest.
pub fn fingerprint(schema: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(schema).as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("{}{}", FINGERPRINT_PREFIX, &digest[..FINGERPRINT_HEX_LEN])
}

/// Serialize a JSON value compactly with object keys sorted recursively.
///
/// Array order is preserved since it is significant (e.g. `required`,
/// `enum`, tuple items).
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Serializing a string cannot fail
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answer_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": { "type": "string" },
                "population": { "type": "integer", "minimum": 0 }
            },
            "required": ["city", "population"]
        })
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint(&answer_schema());

        assert!(fp.starts_with(FINGERPRINT_PREFIX));
        let hex_part = &fp[FINGERPRINT_PREFIX.len()..];
        assert_eq!(hex_part.len(), FINGERPRINT_HEX_LEN);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint(&answer_schema()), fingerprint(&answer_schema()));
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let reordered: Value = serde_json::from_str(
            r#"{
                "required": ["city", "population"],
                "properties": {
                    "population": { "minimum": 0, "type": "integer" },
                    "city": { "type": "string" }
                },
                "type": "object"
            }"#,
        )
        .unwrap();

        assert_eq!(fingerprint(&reordered), fingerprint(&answer_schema()));
    }

    #[test]
    fn test_fingerprint_differs_for_different_structure() {
        let mut other = answer_schema();
        other["properties"]["population"]["type"] = json!("number");

        assert_ne!(fingerprint(&other), fingerprint(&answer_schema()));
    }

    #[test]
    fn test_fingerprint_respects_array_order() {
        let a = json!({ "enum": ["a", "b"] });
        let b = json!({ "enum": ["b", "a"] });

        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value = json!({ "b": { "y": 1, "x": [true, null] }, "a": "s" });

        assert_eq!(canonical_json(&value), r#"{"a":"s","b":{"x":[true,null],"y":1}}"#);
    }
}
