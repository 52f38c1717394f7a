//! In-memory vector index implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::embedding::cosine_similarity;
use crate::domain::semantic_cache::{
    CacheEntry, CacheStats, CandidatePolicy, SemanticCacheConfig, SemanticSearchResult,
    VectorIndex,
};
use crate::domain::DomainError;

/// In-memory vector index using linear search
///
/// Ranks every eligible entry by cosine similarity, so results are exact.
/// Entries keep insertion order and ties resolve to the earlier entry.
/// Suitable for development, tests and small deployments; use
/// `PgvectorVectorIndex` when entries must survive restarts.
#[derive(Debug)]
pub struct InMemoryVectorIndex {
    entries: RwLock<Vec<CacheEntry>>,
    policy: CandidatePolicy,
    dimensions: Option<usize>,
    max_entries: Option<usize>,
    evictions: AtomicU64,
}

impl InMemoryVectorIndex {
    /// Create a new, unbounded in-memory index
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            policy: CandidatePolicy::default(),
            dimensions: None,
            max_entries: None,
            evictions: AtomicU64::new(0),
        }
    }

    /// Build an index honouring the dimensions, multipliers and size bound
    pub fn from_config(config: &SemanticCacheConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let index = Self::new()
            .with_policy(config.candidate_policy()?)
            .with_dimensions(config.dimensions);

        Ok(match config.max_entries {
            Some(max_entries) => index.with_max_entries(max_entries),
            None => index,
        })
    }

    /// Reject stored embeddings whose length differs from `dimensions`
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Bound the number of entries, evicting the least recently used first
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_policy(mut self, policy: CandidatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of entries removed by the size bound
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Evict least recently used entries until one more fits
    fn evict_if_needed(&self, entries: &mut Vec<CacheEntry>) {
        let Some(max_entries) = self.max_entries else {
            return;
        };

        while !entries.is_empty() && entries.len() >= max_entries {
            // First minimum wins, so ties evict the earliest inserted entry
            if let Some(position) = entries
                .iter()
                .enumerate()
                .min_by_key(|(_, entry)| entry.last_accessed_at())
                .map(|(position, _)| position)
            {
                let evicted = entries.remove(position);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(id = ?evicted.id(), "Evicted least recently used cache entry");
            }
        }
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn store(&self, entry: CacheEntry) -> Result<String, DomainError> {
        if let Some(dimensions) = self.dimensions {
            if entry.embedding().len() != dimensions {
                return Err(DomainError::validation(format!(
                    "Embedding has {} dimensions, index expects {}",
                    entry.embedding().len(),
                    dimensions
                )));
            }
        }

        let id = Uuid::new_v4().to_string();

        let mut entries = self.entries.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        self.evict_if_needed(&mut entries);
        entries.push(entry.with_id(id.clone()));

        Ok(id)
    }

    async fn search_similar(
        &self,
        embedding: &[f32],
        limit: usize,
        fingerprint: Option<&str>,
    ) -> Result<Vec<SemanticSearchResult>, DomainError> {
        let plan = self.policy.plan(limit, fingerprint);

        let entries = self.entries.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        // Exhaustive scan: filter before ranking, nothing can be crowded out
        let mut ranked: Vec<(f32, &CacheEntry)> = entries
            .iter()
            .filter(|entry| plan.accepts(entry))
            .map(|entry| (cosine_similarity(embedding, entry.embedding()), entry))
            .collect();

        // Stable sort keeps insertion order among equal scores
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        let results = ranked
            .into_iter()
            .take(plan.limit)
            .map(|(score, entry)| SemanticSearchResult::new(entry.clone(), score.clamp(0.0, 1.0)))
            .collect();

        Ok(results)
    }

    async fn record_hit(&self, id: &str) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(entry) = entries.iter_mut().find(|entry| entry.id() == Some(id)) {
            entry.record_hit(Utc::now());
        }

        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, DomainError> {
        let entries = self.entries.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(CacheStats {
            total_entries: entries.len() as u64,
            total_hits: entries.iter().map(CacheEntry::hit_count).sum(),
            oldest_entry: entries.iter().map(CacheEntry::created_at).min(),
            newest_entry: entries.iter().map(CacheEntry::created_at).max(),
            approx_size_bytes: entries.iter().map(CacheEntry::approx_size_bytes).sum(),
        })
    }

    async fn clear(&self) -> Result<u64, DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        let removed = entries.len() as u64;
        entries.clear();

        Ok(removed)
    }

    async fn close(&self) -> Result<(), DomainError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
