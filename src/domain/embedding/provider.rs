//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::InputType;
use crate::domain::DomainError;

/// Trait for embedding providers (OpenAI, Voyage, etc.)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a batch of texts. The result has exactly one vector per input,
    /// in input order, or the call fails.
    async fn embed_batch(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Embed a single text
    async fn embed(&self, text: &str, input_type: InputType) -> Result<Vec<f32>, DomainError> {
        let vectors = self.embed_batch(&[text.to_string()], input_type).await?;

        vectors
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider(self.provider_name(), "No embedding returned"))
    }

    /// Get the embedding dimensions of the configured model
    fn dimensions(&self) -> usize;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the configured model
    fn model(&self) -> &str;
}
