//! Similarity cache decision engine
//!
//! Turns a query into an embedding-keyed lookup, decides hit or miss against
//! the similarity threshold and, on a miss, asks the completion provider and
//! stores the fresh answer. Cache entries are partitioned by the fingerprint
//! of the response schema, if one is given.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::domain::completion::CompletionProvider;
use crate::domain::embedding::{EmbeddingProvider, InputType};
use crate::domain::schema::ResponseSchema;
use crate::domain::semantic_cache::{
    validate_threshold, Answer, CacheEntry, CacheStats, LookupResult, QueryResult,
    SemanticSearchResult, VectorIndex,
};
use crate::domain::DomainError;
use crate::infrastructure::telemetry::{self, AnswerSource};

/// Threshold used when none is given
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.85;

const NO_COMPLETION_YET: u64 = u64::MAX;

/// Outcome of comparing the best candidate against the threshold
enum Decision {
    Hit(SemanticSearchResult),
    Miss { best_score: Option<f32> },
}

/// Semantic cache in front of a completion provider
#[derive(Debug)]
pub struct SemanticCacheEngine {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    completion_provider: Arc<dyn CompletionProvider>,
    /// f32 bit pattern; last write wins
    threshold: AtomicU32,
    /// Duration of the most recent completion call
    last_completion_ms: AtomicU64,
}

impl SemanticCacheEngine {
    /// Create an engine with the default threshold
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        completion_provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            embedding_provider,
            index,
            completion_provider,
            threshold: AtomicU32::new(DEFAULT_SIMILARITY_THRESHOLD.to_bits()),
            last_completion_ms: AtomicU64::new(NO_COMPLETION_YET),
        }
    }

    /// Create an engine with a custom threshold
    pub fn with_threshold(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        completion_provider: Arc<dyn CompletionProvider>,
        threshold: f32,
    ) -> Result<Self, DomainError> {
        let engine = Self::new(embedding_provider, index, completion_provider);
        engine.set_threshold(threshold)?;
        Ok(engine)
    }

    pub fn threshold(&self) -> f32 {
        f32::from_bits(self.threshold.load(Ordering::Relaxed))
    }

    /// Change the threshold. Values outside `[0, 1]` are rejected and leave
    /// the current threshold in place.
    pub fn set_threshold(&self, threshold: f32) -> Result<(), DomainError> {
        validate_threshold(threshold)?;
        self.threshold.store(threshold.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Answer a query from the cache, or from the completion provider on a miss.
    ///
    /// With a schema, only entries stored under the same schema (or under no
    /// schema at all) can match, and the answer is structured.
    pub async fn query(
        &self,
        text: &str,
        schema: Option<&ResponseSchema>,
    ) -> Result<QueryResult, DomainError> {
        let start = Instant::now();
        let fingerprint = schema.map(ResponseSchema::fingerprint);

        let embedding = self.embedding_provider.embed(text, InputType::Query).await?;

        let decision = self.decide(&embedding, fingerprint.as_deref()).await?;

        match decision {
            Decision::Hit(best) => {
                let response = cached_answer(&best.entry, schema.is_some())?;
                self.record_hit(&best.entry).await?;

                let total_time_ms = elapsed_ms(start);
                let time_saved_ms = self.time_saved(&best.entry, total_time_ms);

                telemetry::record_query_duration(AnswerSource::Cache, start.elapsed());
                debug!(
                    score = best.score,
                    total_time_ms,
                    time_saved_ms = ?time_saved_ms,
                    "Serving cached answer"
                );

                Ok(QueryResult {
                    response,
                    from_cache: true,
                    similarity_score: Some(best.score),
                    total_time_ms,
                    time_saved_ms,
                })
            }
            Decision::Miss { .. } => {
                let completion_start = Instant::now();
                let response = match schema {
                    Some(schema) => Answer::Structured(
                        self.completion_provider
                            .complete_structured(text, schema)
                            .await?,
                    ),
                    None => Answer::Text(self.completion_provider.complete(text).await?),
                };
                let generation_time_ms = elapsed_ms(completion_start);

                telemetry::record_completion(self.completion_provider.model_id());

                let mut entry = CacheEntry::new(text, response.to_stored()?, embedding)
                    .with_generation_time_ms(generation_time_ms);
                if let Some(fp) = fingerprint {
                    entry = entry.with_schema_fingerprint(fp);
                }

                let id = self.index.store(entry).await?;
                self.last_completion_ms
                    .store(generation_time_ms, Ordering::Relaxed);

                telemetry::record_query_duration(AnswerSource::Completion, start.elapsed());
                debug!(id = %id, generation_time_ms, "Stored fresh answer");

                Ok(QueryResult {
                    response,
                    from_cache: false,
                    similarity_score: None,
                    total_time_ms: elapsed_ms(start),
                    time_saved_ms: None,
                })
            }
        }
    }

    /// Query with a schema and deserialize the structured answer into `T`
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        text: &str,
        schema: &ResponseSchema,
    ) -> Result<T, DomainError> {
        self.query(text, Some(schema)).await?.response.into_typed()
    }

    /// Probe the cache without calling the completion provider.
    ///
    /// A hit still counts against the matched entry. A precomputed embedding
    /// skips the embedding call. With a fingerprint the answer is decoded as
    /// structured, like a `query` with a schema.
    pub async fn lookup(
        &self,
        text: &str,
        embedding: Option<&[f32]>,
        fingerprint: Option<&str>,
    ) -> Result<LookupResult, DomainError> {
        let start = Instant::now();

        let computed;
        let embedding = match embedding {
            Some(embedding) => embedding,
            None => {
                computed = self.embedding_provider.embed(text, InputType::Query).await?;
                computed.as_slice()
            }
        };

        let decision = self.decide(embedding, fingerprint).await?;

        let result = match decision {
            Decision::Hit(best) => {
                let response = cached_answer(&best.entry, fingerprint.is_some())?;
                self.record_hit(&best.entry).await?;

                LookupResult {
                    hit: true,
                    response: Some(response),
                    score: Some(best.score),
                    lookup_time_ms: elapsed_ms(start),
                }
            }
            Decision::Miss { best_score } => LookupResult {
                hit: false,
                response: None,
                score: best_score,
                lookup_time_ms: elapsed_ms(start),
            },
        };

        Ok(result)
    }

    pub async fn stats(&self) -> Result<CacheStats, DomainError> {
        self.index.stats().await
    }

    pub async fn clear(&self) -> Result<u64, DomainError> {
        let removed = self.index.clear().await?;
        info!(removed, backend = self.index.backend_name(), "Cleared semantic cache");
        Ok(removed)
    }

    pub async fn close(&self) -> Result<(), DomainError> {
        self.index.close().await?;
        info!(backend = self.index.backend_name(), "Closed semantic cache");
        Ok(())
    }

    /// Find the best candidate and apply the threshold
    async fn decide(
        &self,
        embedding: &[f32],
        fingerprint: Option<&str>,
    ) -> Result<Decision, DomainError> {
        let threshold = self.threshold();
        let best = self.index.find_best(embedding, fingerprint).await?;

        let decision = match best {
            Some(best) if best.score >= threshold => Decision::Hit(best),
            other => Decision::Miss {
                best_score: other.map(|b| b.score),
            },
        };

        let (hit, score) = match &decision {
            Decision::Hit(best) => (true, Some(best.score)),
            Decision::Miss { best_score } => (false, *best_score),
        };
        telemetry::record_lookup(hit);
        debug!(hit, threshold, score = ?score, fingerprint = ?fingerprint, "Semantic cache decision");

        Ok(decision)
    }

    /// Count a served hit. Entries without an id are not tracked.
    async fn record_hit(&self, entry: &CacheEntry) -> Result<(), DomainError> {
        match entry.id() {
            Some(id) => self.index.record_hit(id).await,
            None => Ok(()),
        }
    }

    /// Generation time of the entry, or of the last completion when the
    /// entry does not carry one, minus the time this hit took
    fn time_saved(&self, entry: &CacheEntry, total_time_ms: u64) -> Option<u64> {
        let baseline = entry.generation_time_ms().or_else(|| {
            match self.last_completion_ms.load(Ordering::Relaxed) {
                NO_COMPLETION_YET => None,
                ms => Some(ms),
            }
        })?;

        baseline.checked_sub(total_time_ms).filter(|saved| *saved > 0)
    }
}

/// Decode a cached response, as JSON when the caller asked for structure
fn cached_answer(entry: &CacheEntry, structured: bool) -> Result<Answer, DomainError> {
    if structured {
        Ok(Answer::Structured(entry.response_json()?))
    } else {
        Ok(Answer::Text(entry.response().to_string()))
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
