//! PMP Semantic Cache
//!
//! Reuses language-model answers for semantically similar queries:
//! - Embedding-keyed lookups with a similarity threshold
//! - Cache partitioning by response schema fingerprint
//! - In-memory and pgvector vector indexes
//! - OpenAI and Voyage embeddings, OpenAI-compatible completions

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use config::{CompletionConfig, EmbeddingConfig, EmbeddingProviderKind, IndexBackend};
use domain::{CompletionProvider, EmbeddingProvider, VectorIndex};
use infrastructure::{
    embedding::{OpenAiEmbeddingProvider, VoyageEmbeddingProvider},
    llm::{HttpClient, OpenAiCompletionProvider},
    semantic_cache::{InMemoryVectorIndex, PgvectorVectorIndex},
    services::SemanticCacheEngine,
};
use tracing::{info, warn};

/// Create the engine and its collaborators from configuration
pub async fn create_engine(config: &AppConfig) -> anyhow::Result<SemanticCacheEngine> {
    config.validate()?;

    let embedding_provider = create_embedding_provider(&config.embedding, config.cache.dimensions)?;
    let index = create_vector_index(config).await?;
    let completion_provider = create_completion_provider(&config.completion)?;

    let engine = SemanticCacheEngine::with_threshold(
        embedding_provider,
        index,
        completion_provider,
        config.cache.similarity_threshold,
    )?;

    info!(
        threshold = config.cache.similarity_threshold,
        backend = ?config.index.backend,
        "Semantic cache engine ready"
    );

    Ok(engine)
}

fn read_api_key(env_name: &str) -> String {
    std::env::var(env_name).unwrap_or_else(|_| {
        warn!("{} is not set, sending requests without an API key", env_name);
        String::new()
    })
}

fn create_embedding_provider(
    config: &EmbeddingConfig,
    dimensions: usize,
) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
    let api_key = read_api_key(&config.api_key_env);

    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderKind::Openai => {
            let provider = match config.base_url {
                Some(ref url) => {
                    info!("Using OpenAI embeddings with custom base URL: {}", url);
                    OpenAiEmbeddingProvider::with_base_url(client, api_key, &config.model, url)
                }
                None => OpenAiEmbeddingProvider::new(client, api_key, &config.model),
            };
            Arc::new(provider.with_dimensions(dimensions))
        }
        EmbeddingProviderKind::Voyage => {
            let provider = match config.base_url {
                Some(ref url) => {
                    info!("Using Voyage embeddings with custom base URL: {}", url);
                    VoyageEmbeddingProvider::with_base_url(client, api_key, &config.model, url)
                }
                None => VoyageEmbeddingProvider::new(client, api_key, &config.model),
            };
            Arc::new(provider.with_dimensions(dimensions))
        }
    };

    info!(
        provider = provider.provider_name(),
        model = provider.model(),
        dimensions = provider.dimensions(),
        "Embedding provider configured"
    );

    Ok(provider)
}

async fn create_vector_index(config: &AppConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    match config.index.backend {
        IndexBackend::Memory => {
            info!("Using in-memory vector index");
            Ok(Arc::new(InMemoryVectorIndex::from_config(&config.cache)?))
        }
        IndexBackend::Pgvector => {
            let database_url = config
                .index
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("index.database_url is required for pgvector"))?;

            info!("Connecting to PostgreSQL...");
            let index = PgvectorVectorIndex::connect(
                database_url,
                config.index.max_connections,
                &config.cache,
            )
            .await?;
            index.ensure_schema().await?;
            info!(collection = %config.cache.collection, "Using pgvector vector index");

            Ok(Arc::new(index))
        }
    }
}

fn create_completion_provider(
    config: &CompletionConfig,
) -> anyhow::Result<Arc<dyn CompletionProvider>> {
    let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
    let api_key = read_api_key(&config.api_key_env);

    let mut provider = match config.base_url {
        Some(ref url) => {
            info!("Using completion provider with custom base URL: {}", url);
            OpenAiCompletionProvider::with_base_url(client, api_key, &config.model, url)
        }
        None => OpenAiCompletionProvider::new(client, api_key, &config.model),
    };

    if let Some(ref system_prompt) = config.system_prompt {
        provider = provider.with_system_prompt(system_prompt);
    }

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AppConfig {
        let mut config = AppConfig::default();
        config.cache.dimensions = 3;
        config.embedding.base_url = Some(server.uri());
        config.embedding.api_key_env = "PMP_SEMANTIC_CACHE_TEST_UNSET_KEY".to_string();
        config.completion.base_url = Some(server.uri());
        config.completion.api_key_env = "PMP_SEMANTIC_CACHE_TEST_UNSET_KEY".to_string();
        config
    }

    #[tokio::test]
    async fn test_create_engine_end_to_end() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "text-embedding-3-small",
                "data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Paris."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let engine = create_engine(&config_for(&server)).await.unwrap();

        let miss = engine.query("What is the capital of France?", None).await.unwrap();
        let hit = engine.query("What is the capital of France?", None).await.unwrap();

        assert!(!miss.from_cache);
        assert!(hit.from_cache);
        assert_eq!(hit.response.as_text(), Some("Paris."));
        assert_eq!(engine.stats().await.unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_create_engine_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.cache.similarity_threshold = 1.2;

        assert!(create_engine(&config).await.is_err());
    }
}
