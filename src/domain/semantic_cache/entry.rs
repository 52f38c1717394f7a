//! Cache entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A stored query/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Identifier assigned by the index on store
    id: Option<String>,
    /// The original query text
    query: String,
    /// The cached response: plain text, or JSON text for structured answers
    response: String,
    /// The embedding vector of the query
    embedding: Vec<f32>,
    /// When this entry was created
    created_at: DateTime<Utc>,
    /// Number of cache hits
    hit_count: u64,
    /// When this entry was last served as a hit (creation time until then)
    last_accessed_at: DateTime<Utc>,
    /// Fingerprint of the response schema, absent for untyped entries
    schema_fingerprint: Option<String>,
    /// How long the completion that produced this entry took
    generation_time_ms: Option<u64>,
    /// Additional metadata
    metadata: Option<serde_json::Value>,
}

impl CacheEntry {
    /// Create a new, not yet stored entry
    pub fn new(query: impl Into<String>, response: impl Into<String>, embedding: Vec<f32>) -> Self {
        let now = Utc::now();

        Self {
            id: None,
            query: query.into(),
            response: response.into(),
            embedding,
            created_at: now,
            hit_count: 0,
            last_accessed_at: now,
            schema_fingerprint: None,
            generation_time_ms: None,
            metadata: None,
        }
    }

    /// Assign the identifier (done by the index)
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_schema_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.schema_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_generation_time_ms(mut self, millis: u64) -> Self {
        self.generation_time_ms = Some(millis);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Restore the lifecycle fields of a persisted entry
    pub fn with_lifecycle(
        mut self,
        created_at: DateTime<Utc>,
        hit_count: u64,
        last_accessed_at: DateTime<Utc>,
    ) -> Self {
        self.created_at = created_at;
        self.hit_count = hit_count;
        self.last_accessed_at = last_accessed_at.max(created_at);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    pub fn last_accessed_at(&self) -> DateTime<Utc> {
        self.last_accessed_at
    }

    pub fn schema_fingerprint(&self) -> Option<&str> {
        self.schema_fingerprint.as_deref()
    }

    pub fn generation_time_ms(&self) -> Option<u64> {
        self.generation_time_ms
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    /// Count one hit at `at`
    pub fn record_hit(&mut self, at: DateTime<Utc>) {
        self.hit_count += 1;
        self.last_accessed_at = at.max(self.created_at);
    }

    /// Whether this entry may answer a lookup filtered by `filter`.
    ///
    /// Entries without a fingerprint predate typed caching and match any filter.
    pub fn matches_fingerprint(&self, filter: Option<&str>) -> bool {
        match (filter, self.schema_fingerprint()) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(wanted), Some(stored)) => wanted == stored,
        }
    }

    /// Rough in-memory footprint, used for statistics only
    pub fn approx_size_bytes(&self) -> u64 {
        let strings = self.query.len()
            + self.response.len()
            + self.id.as_ref().map_or(0, String::len)
            + self.schema_fingerprint.as_ref().map_or(0, String::len)
            + self.metadata.as_ref().map_or(0, |m| m.to_string().len());

        (strings + self.embedding.len() * std::mem::size_of::<f32>() + 48) as u64
    }

    /// Parse the stored response as JSON
    pub fn response_json(&self) -> Result<serde_json::Value, DomainError> {
        self.deserialize_response()
    }

    /// Deserialize the stored response into a typed value
    pub fn deserialize_response<T: for<'de> Deserialize<'de>>(&self) -> Result<T, DomainError> {
        serde_json::from_str(&self.response).map_err(|e| {
            DomainError::deserialization(format!("Failed to deserialize cached response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_entry() {
        let entry = CacheEntry::new("What is the capital of France?", "Paris.", vec![0.1, 0.2]);

        assert!(entry.id().is_none());
        assert_eq!(entry.query(), "What is the capital of France?");
        assert_eq!(entry.response(), "Paris.");
        assert_eq!(entry.hit_count(), 0);
        assert_eq!(entry.created_at(), entry.last_accessed_at());
        assert!(entry.schema_fingerprint().is_none());
        assert!(entry.generation_time_ms().is_none());
    }

    #[test]
    fn test_builder_fields() {
        let entry = CacheEntry::new("q", "{}", vec![1.0])
            .with_id("abc")
            .with_schema_fingerprint("schema_0123456789abcdef")
            .with_generation_time_ms(850)
            .with_metadata(serde_json::json!({"source": "test"}));

        assert_eq!(entry.id(), Some("abc"));
        assert_eq!(entry.schema_fingerprint(), Some("schema_0123456789abcdef"));
        assert_eq!(entry.generation_time_ms(), Some(850));
        assert!(entry.metadata().is_some());
    }

    #[test]
    fn test_record_hit() {
        let mut entry = CacheEntry::new("q", "a", vec![1.0]);
        let later = entry.created_at() + Duration::seconds(5);

        entry.record_hit(later);
        entry.record_hit(later + Duration::seconds(1));

        assert_eq!(entry.hit_count(), 2);
        assert_eq!(entry.last_accessed_at(), later + Duration::seconds(1));
    }

    #[test]
    fn test_last_accessed_never_precedes_creation() {
        let mut entry = CacheEntry::new("q", "a", vec![1.0]);
        let earlier = entry.created_at() - Duration::seconds(10);

        entry.record_hit(earlier);

        assert_eq!(entry.last_accessed_at(), entry.created_at());
    }

    #[test]
    fn test_matches_fingerprint() {
        let typed = CacheEntry::new("q", "{}", vec![1.0]).with_schema_fingerprint("schema_a");
        let legacy = CacheEntry::new("q", "a", vec![1.0]);

        assert!(typed.matches_fingerprint(None));
        assert!(typed.matches_fingerprint(Some("schema_a")));
        assert!(!typed.matches_fingerprint(Some("schema_b")));
        assert!(legacy.matches_fingerprint(Some("schema_a")));
        assert!(legacy.matches_fingerprint(None));
    }

    #[test]
    fn test_deserialize_response() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Capital {
            city: String,
        }

        let entry = CacheEntry::new("q", r#"{"city": "Paris"}"#, vec![1.0]);

        let value: Capital = entry.deserialize_response().unwrap();

        assert_eq!(value.city, "Paris");
    }

    #[test]
    fn test_deserialize_response_failure() {
        let entry = CacheEntry::new("q", "Paris.", vec![1.0]);

        let result = entry.response_json();

        assert!(matches!(result, Err(DomainError::Deserialization { .. })));
    }

    #[test]
    fn test_approx_size_counts_embedding() {
        let small = CacheEntry::new("q", "a", vec![0.0; 4]);
        let large = CacheEntry::new("q", "a", vec![0.0; 1536]);

        assert!(large.approx_size_bytes() > small.approx_size_bytes());
        assert!(large.approx_size_bytes() >= 1536 * 4);
    }
}
