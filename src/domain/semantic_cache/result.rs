//! Outcomes of cache queries and lookups

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainError;

/// An answer, either free text or a structured JSON value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Structured(Value),
}

impl Answer {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            Answer::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Answer::Text(_) => None,
            Answer::Structured(value) => Some(value),
        }
    }

    /// Encoding used for storage: text as-is, structured values as JSON text
    pub fn to_stored(&self) -> Result<String, DomainError> {
        match self {
            Answer::Text(text) => Ok(text.clone()),
            Answer::Structured(value) => serde_json::to_string(value).map_err(|e| {
                DomainError::internal(format!("Failed to serialize response for cache: {}", e))
            }),
        }
    }

    /// Convert a structured answer into a typed value
    pub fn into_typed<T: for<'de> Deserialize<'de>>(self) -> Result<T, DomainError> {
        let value = match self {
            Answer::Structured(value) => value,
            Answer::Text(_) => {
                return Err(DomainError::deserialization(
                    "Expected a structured answer, got free text",
                ))
            }
        };

        serde_json::from_value(value).map_err(|e| {
            DomainError::deserialization(format!("Answer does not match expected shape: {}", e))
        })
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Text(text) => f.write_str(text),
            Answer::Structured(value) => write!(f, "{}", value),
        }
    }
}

/// Outcome of [`SemanticCacheEngine::query`](crate::infrastructure::services::SemanticCacheEngine::query)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub response: Answer,
    pub from_cache: bool,
    /// Similarity of the matched entry, present on hits only
    pub similarity_score: Option<f32>,
    pub total_time_ms: u64,
    /// Estimated time the hit saved compared to calling the model
    pub time_saved_ms: Option<u64>,
}

/// Outcome of a side-effect-free probe of the cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub hit: bool,
    /// The cached answer, present on hits only
    pub response: Option<Answer>,
    /// Best candidate score, present whenever a candidate exists
    pub score: Option<f32>,
    pub lookup_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_answer_is_stored_verbatim() {
        let answer = Answer::Text("Paris.".to_string());

        assert_eq!(answer.to_stored().unwrap(), "Paris.");
        assert_eq!(answer.as_text(), Some("Paris."));
        assert!(answer.as_structured().is_none());
    }

    #[test]
    fn test_structured_answer_is_stored_as_json() {
        let answer = Answer::Structured(json!({"city": "Paris"}));

        assert_eq!(answer.to_stored().unwrap(), r#"{"city":"Paris"}"#);
    }

    #[test]
    fn test_into_typed() {
        #[derive(Debug, Deserialize)]
        struct Capital {
            city: String,
        }

        let capital: Capital = Answer::Structured(json!({"city": "Paris"}))
            .into_typed()
            .unwrap();

        assert_eq!(capital.city, "Paris");
    }

    #[test]
    fn test_into_typed_shape_mismatch() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Capital {
            city: String,
        }

        let result = Answer::Structured(json!({"town": "Paris"})).into_typed::<Capital>();
        assert!(matches!(result, Err(DomainError::Deserialization { .. })));

        let result = Answer::Text("Paris".into()).into_typed::<Capital>();
        assert!(matches!(result, Err(DomainError::Deserialization { .. })));
    }
}
