//! Embedding response types

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A single embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    /// Index of this embedding in the batch
    index: usize,
    /// The embedding vector
    embedding: Vec<f32>,
}

impl Embedding {
    pub fn new(index: usize, embedding: Vec<f32>) -> Self {
        Self { index, embedding }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn vector(&self) -> &[f32] {
        &self.embedding
    }

    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }

    pub fn into_vector(self) -> Vec<f32> {
        self.embedding
    }
}

/// Response from an embedding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Model used
    model: String,
    /// Generated embeddings
    data: Vec<Embedding>,
}

impl EmbeddingResponse {
    pub fn new(model: impl Into<String>, data: Vec<Embedding>) -> Self {
        Self {
            model: model.into(),
            data,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.data
    }

    /// Consume the response into vectors ordered by batch index.
    ///
    /// Fails when the provider returned a different number of vectors than
    /// were requested, or any vector is empty.
    pub fn into_vectors(
        self,
        provider: &str,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        if self.data.len() != expected {
            return Err(DomainError::provider(
                provider,
                format!(
                    "Embedding batch size mismatch: requested {}, received {}",
                    expected,
                    self.data.len()
                ),
            ));
        }

        let mut data = self.data;
        data.sort_by_key(|e| e.index());

        data.into_iter()
            .map(|e| {
                if e.dimensions() == 0 {
                    Err(DomainError::provider(
                        provider,
                        format!("Empty embedding returned at index {}", e.index()),
                    ))
                } else {
                    Ok(e.into_vector())
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_creation() {
        let emb = Embedding::new(0, vec![0.1, 0.2, 0.3]);

        assert_eq!(emb.index(), 0);
        assert_eq!(emb.dimensions(), 3);
        assert_eq!(emb.vector(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_into_vectors_orders_by_index() {
        let response = EmbeddingResponse::new(
            "test-model",
            vec![
                Embedding::new(1, vec![0.3, 0.4]),
                Embedding::new(0, vec![0.1, 0.2]),
            ],
        );

        let vectors = response.into_vectors("test", 2).unwrap();

        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn test_into_vectors_batch_mismatch() {
        let response = EmbeddingResponse::new("test-model", vec![Embedding::new(0, vec![0.1])]);

        let result = response.into_vectors("test", 2);

        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[test]
    fn test_into_vectors_empty_embedding() {
        let response = EmbeddingResponse::new("test-model", vec![Embedding::new(0, vec![])]);

        assert!(response.into_vectors("test", 1).is_err());
    }
}
