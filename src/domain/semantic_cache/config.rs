//! Semantic cache configuration

use serde::{Deserialize, Serialize};

use super::CandidatePolicy;
use crate::domain::DomainError;

/// Configuration for semantic caching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Similarity threshold for cache hits (0.0 to 1.0)
    /// Higher values require more similar queries
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Collection (table) holding cache entries
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Name of the vector field inside the collection
    #[serde(default = "default_embedding_field")]
    pub embedding_field: String,

    /// Embedding dimensionality, fixed for the lifetime of a collection
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Raw ANN candidates requested per result slot
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,

    /// Results fetched per result slot before fingerprint filtering
    #[serde(default = "default_prefilter_multiplier")]
    pub prefilter_multiplier: usize,

    /// Optional bound on stored entries (least recently used evicted first).
    /// Unbounded when absent.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

fn default_similarity_threshold() -> f32 {
    0.85
}

fn default_collection() -> String {
    "semantic_cache".to_string()
}

fn default_embedding_field() -> String {
    "embedding".to_string()
}

fn default_dimensions() -> usize {
    1536
}

fn default_candidate_multiplier() -> usize {
    10
}

fn default_prefilter_multiplier() -> usize {
    5
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            collection: default_collection(),
            embedding_field: default_embedding_field(),
            dimensions: default_dimensions(),
            candidate_multiplier: default_candidate_multiplier(),
            prefilter_multiplier: default_prefilter_multiplier(),
            max_entries: None,
        }
    }
}

impl SemanticCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the collection name
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the embedding field name
    pub fn with_embedding_field(mut self, field: impl Into<String>) -> Self {
        self.embedding_field = field.into();
        self
    }

    /// Set the embedding dimensions
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Set the candidate widening multipliers
    pub fn with_multipliers(mut self, candidate: usize, prefilter: usize) -> Self {
        self.candidate_multiplier = candidate;
        self.prefilter_multiplier = prefilter;
        self
    }

    /// Bound the number of stored entries
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Candidate widening policy derived from the multipliers
    pub fn candidate_policy(&self) -> Result<CandidatePolicy, DomainError> {
        CandidatePolicy::new(self.candidate_multiplier, self.prefilter_multiplier)
    }

    /// Check every value is usable
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_threshold(self.similarity_threshold)?;
        self.candidate_policy()?;

        if self.dimensions == 0 {
            return Err(DomainError::configuration("Embedding dimensions must be positive"));
        }

        if self.collection.trim().is_empty() {
            return Err(DomainError::configuration("Collection name must not be empty"));
        }

        if self.embedding_field.trim().is_empty() {
            return Err(DomainError::configuration("Embedding field name must not be empty"));
        }

        if self.max_entries == Some(0) {
            return Err(DomainError::configuration("max_entries must be positive when set"));
        }

        Ok(())
    }
}

/// Reject thresholds outside `[0, 1]` (inclusive on both ends)
pub fn validate_threshold(threshold: f32) -> Result<(), DomainError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(DomainError::validation(format!(
            "Similarity threshold must be within [0, 1], got {}",
            threshold
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SemanticCacheConfig::default();

        assert!((config.similarity_threshold - 0.85).abs() < f32::EPSILON);
        assert_eq!(config.collection, "semantic_cache");
        assert_eq!(config.embedding_field, "embedding");
        assert_eq!(config.dimensions, 1536);
        assert_eq!(config.candidate_multiplier, 10);
        assert_eq!(config.prefilter_multiplier, 5);
        assert!(config.max_entries.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SemanticCacheConfig::new()
            .with_similarity_threshold(0.9)
            .with_collection("answers")
            .with_embedding_field("query_vector")
            .with_dimensions(1024)
            .with_multipliers(20, 4)
            .with_max_entries(500);

        assert!((config.similarity_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.collection, "answers");
        assert_eq!(config.embedding_field, "query_vector");
        assert_eq!(config.dimensions, 1024);
        assert_eq!(config.max_entries, Some(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_bounds_are_inclusive() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(-0.01).is_err());
        assert!(validate_threshold(1.01).is_err());
        assert!(validate_threshold(f32::NAN).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_multipliers() {
        let config = SemanticCacheConfig::new().with_multipliers(5, 5);
        assert!(config.validate().is_err());

        let config = SemanticCacheConfig::new().with_multipliers(4, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = SemanticCacheConfig::new().with_similarity_threshold(1.5);

        assert!(matches!(config.validate(), Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: SemanticCacheConfig =
            serde_json::from_str(r#"{"similarity_threshold": 0.7}"#).unwrap();

        assert!((config.similarity_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.collection, "semantic_cache");
    }
}
