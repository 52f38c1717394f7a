//! Vector index trait and types

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CacheEntry;
use crate::domain::DomainError;

/// Result of a similarity search
#[derive(Debug, Clone)]
pub struct SemanticSearchResult {
    /// The matching cached entry
    pub entry: CacheEntry,
    /// Cosine similarity to the query embedding (0.0 to 1.0)
    pub score: f32,
}

impl SemanticSearchResult {
    pub fn new(entry: CacheEntry, score: f32) -> Self {
        Self { entry, score }
    }
}

/// Aggregate statistics, computed live from the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: u64,
    /// Sum of hit counts over all entries
    pub total_hits: u64,
    /// Creation time of the oldest entry
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Creation time of the newest entry
    pub newest_entry: Option<DateTime<Utc>>,
    /// Approximate storage footprint
    pub approx_size_bytes: u64,
}

impl CacheStats {
    /// Average hits per entry
    pub fn hits_per_entry(&self) -> f64 {
        if self.total_entries == 0 {
            return 0.0;
        }

        self.total_hits as f64 / self.total_entries as f64
    }
}

/// Trait for similarity-searchable storage of cache entries
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    /// Persist a new entry and return its freshly assigned id.
    ///
    /// No uniqueness check is made on query or embedding.
    async fn store(&self, entry: CacheEntry) -> Result<String, DomainError>;

    /// Return up to `limit` entries ranked by descending similarity.
    ///
    /// With a fingerprint, only entries carrying that fingerprint or none at
    /// all are eligible. An empty index yields an empty list.
    async fn search_similar(
        &self,
        embedding: &[f32],
        limit: usize,
        fingerprint: Option<&str>,
    ) -> Result<Vec<SemanticSearchResult>, DomainError>;

    /// Find the single most similar entry
    async fn find_best(
        &self,
        embedding: &[f32],
        fingerprint: Option<&str>,
    ) -> Result<Option<SemanticSearchResult>, DomainError> {
        let results = self.search_similar(embedding, 1, fingerprint).await?;
        Ok(results.into_iter().next())
    }

    /// Increment the hit count of an entry and stamp its access time
    async fn record_hit(&self, id: &str) -> Result<(), DomainError>;

    /// Get cache statistics
    async fn stats(&self) -> Result<CacheStats, DomainError>;

    /// Remove every entry, returning how many were removed
    async fn clear(&self) -> Result<u64, DomainError>;

    /// Release held connections. Safe to call more than once.
    async fn close(&self) -> Result<(), DomainError>;

    /// Get the backend name
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_per_entry() {
        let stats = CacheStats {
            total_entries: 4,
            total_hits: 10,
            ..Default::default()
        };

        assert!((stats.hits_per_entry() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hits_per_entry_empty() {
        assert_eq!(CacheStats::default().hits_per_entry(), 0.0);
    }
}
