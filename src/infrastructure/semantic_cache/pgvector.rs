//! pgvector-backed vector index
//!
//! Entries live in a PostgreSQL table with an HNSW cosine index on the
//! embedding column. Ranking is approximate; fingerprint filtering happens
//! after ranking, so searches widen according to the [`CandidatePolicy`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use crate::domain::semantic_cache::{
    CacheEntry, CacheStats, CandidatePolicy, SemanticCacheConfig, SemanticSearchResult,
    VectorIndex,
};
use crate::domain::DomainError;

const MIN_EF_SEARCH: usize = 40;
const MAX_EF_SEARCH: usize = 1000;

/// pgvector-based vector index
#[derive(Debug, Clone)]
pub struct PgvectorVectorIndex {
    pool: PgPool,
    table: String,
    column: String,
    dimensions: usize,
    policy: CandidatePolicy,
}

impl PgvectorVectorIndex {
    /// Wrap an existing pool
    pub fn new(pool: PgPool, config: &SemanticCacheConfig) -> Result<Self, DomainError> {
        validate_identifier(&config.collection)?;
        validate_identifier(&config.embedding_field)?;

        Ok(Self {
            pool,
            table: config.collection.clone(),
            column: config.embedding_field.clone(),
            dimensions: config.dimensions,
            policy: config.candidate_policy()?,
        })
    }

    /// Open a pool against `database_url`
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        config: &SemanticCacheConfig,
    ) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to database: {}", e)))?;

        Self::new(pool, config)
    }

    /// Create the vector extension, table and indexes if missing
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create vector extension: {}", e)))?;

        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id UUID PRIMARY KEY,
                query TEXT NOT NULL,
                response TEXT NOT NULL,
                {column} vector({dimensions}) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                hit_count BIGINT NOT NULL DEFAULT 0,
                last_accessed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                schema_fingerprint TEXT,
                generation_time_ms BIGINT,
                metadata JSONB
            )
            "#,
            table = self.table,
            column = self.column,
            dimensions = self.dimensions,
        );

        sqlx::query(&create_table)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        let vector_index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table} USING hnsw ({column} vector_cosine_ops)",
            table = self.table,
            column = self.column,
        );

        sqlx::query(&vector_index)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create vector index: {}", e)))?;

        let fingerprint_index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_schema_fingerprint ON {table} (schema_fingerprint)",
            table = self.table,
        );

        sqlx::query(&fingerprint_index)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create fingerprint index: {}", e)))?;

        Ok(())
    }

    fn select_columns(&self) -> String {
        format!(
            "id::text AS id, query, response, {column}::text AS embedding, created_at, hit_count, \
             last_accessed_at, schema_fingerprint, generation_time_ms, metadata",
            column = self.column
        )
    }
}

#[async_trait]
impl VectorIndex for PgvectorVectorIndex {
    async fn store(&self, entry: CacheEntry) -> Result<String, DomainError> {
        if entry.embedding().len() != self.dimensions {
            return Err(DomainError::validation(format!(
                "Embedding has {} dimensions, index expects {}",
                entry.embedding().len(),
                self.dimensions
            )));
        }

        let id = Uuid::new_v4();
        let query = format!(
            r#"
            INSERT INTO {table} (id, query, response, {column}, created_at, hit_count,
                                 last_accessed_at, schema_fingerprint, generation_time_ms, metadata)
            VALUES ($1, $2, $3, $4::text::vector, $5, $6, $7, $8, $9, $10)
            "#,
            table = self.table,
            column = self.column,
        );

        sqlx::query(&query)
            .bind(id)
            .bind(entry.query())
            .bind(entry.response())
            .bind(embedding_to_pgvector(entry.embedding()))
            .bind(entry.created_at())
            .bind(entry.hit_count() as i64)
            .bind(entry.last_accessed_at())
            .bind(entry.schema_fingerprint())
            .bind(entry.generation_time_ms().map(|ms| ms as i64))
            .bind(entry.metadata().cloned())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to store cache entry: {}", e)))?;

        Ok(id.to_string())
    }

    async fn search_similar(
        &self,
        embedding: &[f32],
        limit: usize,
        fingerprint: Option<&str>,
    ) -> Result<Vec<SemanticSearchResult>, DomainError> {
        let plan = self.policy.plan(limit, fingerprint);
        if plan.limit == 0 {
            return Ok(Vec::new());
        }

        debug!(
            table = %self.table,
            limit = plan.limit,
            num_candidates = plan.num_candidates,
            prefilter_limit = plan.prefilter_limit,
            filtered = plan.is_filtered(),
            "Searching vector index"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        // SET does not accept bind parameters; the value is a computed integer
        sqlx::query(&format!("SET LOCAL hnsw.ef_search = {}", ef_search(plan.num_candidates)))
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to set ef_search: {}", e)))?;

        let query = format!(
            "SELECT {columns}, {column} <=> $1::text::vector AS distance FROM {table} ORDER BY distance LIMIT $2",
            columns = self.select_columns(),
            column = self.column,
            table = self.table,
        );

        let rows = sqlx::query(&query)
            .bind(embedding_to_pgvector(embedding))
            .bind(plan.prefilter_limit as i64)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Search failed: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit transaction: {}", e)))?;

        let ranked = rows
            .iter()
            .map(|row| {
                let distance: f64 = row
                    .try_get("distance")
                    .map_err(|e| DomainError::storage(format!("Invalid distance column: {}", e)))?;
                Ok(SemanticSearchResult::new(row_to_entry(row)?, to_similarity(distance)))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(plan.finalize(ranked))
    }

    async fn record_hit(&self, id: &str) -> Result<(), DomainError> {
        let id = Uuid::parse_str(id)
            .map_err(|e| DomainError::validation(format!("Invalid entry id '{}': {}", id, e)))?;

        let query = format!(
            "UPDATE {} SET hit_count = hit_count + 1, last_accessed_at = GREATEST(NOW(), created_at) WHERE id = $1",
            self.table
        );

        sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to record hit: {}", e)))?;

        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, DomainError> {
        let query = format!(
            r#"
            SELECT
                COUNT(*) AS total_entries,
                COALESCE(SUM(hit_count), 0)::bigint AS total_hits,
                MIN(created_at) AS oldest_entry,
                MAX(created_at) AS newest_entry,
                pg_total_relation_size('{table}'::regclass) AS size_bytes
            FROM {table}
            "#,
            table = self.table
        );

        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get stats: {}", e)))?;

        let read = |e: sqlx::Error| DomainError::storage(format!("Invalid stats row: {}", e));

        Ok(CacheStats {
            total_entries: row.try_get::<i64, _>("total_entries").map_err(read)?.max(0) as u64,
            total_hits: row.try_get::<i64, _>("total_hits").map_err(read)?.max(0) as u64,
            oldest_entry: row.try_get("oldest_entry").map_err(read)?,
            newest_entry: row.try_get("newest_entry").map_err(read)?,
            approx_size_bytes: row.try_get::<i64, _>("size_bytes").map_err(read)?.max(0) as u64,
        })
    }

    async fn clear(&self) -> Result<u64, DomainError> {
        let result = sqlx::query(&format!("DELETE FROM {}", self.table))
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to clear cache: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<(), DomainError> {
        self.pool.close().await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "pgvector"
    }
}

fn row_to_entry(row: &PgRow) -> Result<CacheEntry, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Invalid cache row: {}", e));

    let id: String = row.try_get("id").map_err(read)?;
    let query: String = row.try_get("query").map_err(read)?;
    let response: String = row.try_get("response").map_err(read)?;
    let embedding: String = row.try_get("embedding").map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    let hit_count: i64 = row.try_get("hit_count").map_err(read)?;
    let last_accessed_at: DateTime<Utc> = row.try_get("last_accessed_at").map_err(read)?;
    let fingerprint: Option<String> = row.try_get("schema_fingerprint").map_err(read)?;
    let generation_time_ms: Option<i64> = row.try_get("generation_time_ms").map_err(read)?;
    let metadata: Option<serde_json::Value> = row.try_get("metadata").map_err(read)?;

    let mut entry = CacheEntry::new(query, response, parse_pgvector(&embedding)?)
        .with_id(id)
        .with_lifecycle(created_at, hit_count.max(0) as u64, last_accessed_at);

    if let Some(fp) = fingerprint {
        entry = entry.with_schema_fingerprint(fp);
    }
    if let Some(ms) = generation_time_ms {
        entry = entry.with_generation_time_ms(ms.max(0) as u64);
    }
    if let Some(metadata) = metadata {
        entry = entry.with_metadata(metadata);
    }

    Ok(entry)
}

/// Check that a table or column name is a plain SQL identifier
pub fn validate_identifier(name: &str) -> Result<(), DomainError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DomainError::configuration(format!(
            "Invalid SQL identifier '{}'",
            name
        )))
    }
}

/// HNSW search breadth for a candidate count
fn ef_search(num_candidates: usize) -> usize {
    num_candidates.clamp(MIN_EF_SEARCH, MAX_EF_SEARCH)
}

/// Cosine distance to similarity in `[0, 1]`
fn to_similarity(distance: f64) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0) as f32
}

fn embedding_to_pgvector(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

fn parse_pgvector(s: &str) -> Result<Vec<f32>, DomainError> {
    let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
    if trimmed.trim().is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<Vec<f32>, _>>()
        .map_err(|e| DomainError::storage(format!("Failed to parse vector: {}", e)))
}
