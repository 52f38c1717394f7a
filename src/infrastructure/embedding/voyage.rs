//! Voyage AI embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use super::HttpClientTrait;
use crate::domain::embedding::{
    Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, InputType,
};
use crate::domain::DomainError;

const DEFAULT_VOYAGE_BASE_URL: &str = "https://api.voyageai.com";

const EMBEDDING_MODELS: &[(&str, usize)] = &[
    ("voyage-3", 1024),
    ("voyage-3-large", 1024),
    ("voyage-3-lite", 512),
    ("voyage-code-3", 1024),
];

/// Voyage AI embedding provider
///
/// Voyage models are asymmetric: the input type is forwarded so queries and
/// stored documents are encoded for retrieval.
#[derive(Debug)]
pub struct VoyageEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    dimensions: usize,
    request_dimensions: bool,
}

impl<C: HttpClientTrait> VoyageEmbeddingProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_VOYAGE_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let dimensions = EMBEDDING_MODELS
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, dims)| *dims)
            .unwrap_or(1024);

        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model,
            dimensions,
            request_dimensions: false,
        }
    }

    /// Request a specific output dimension (`output_dimension` on the wire)
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.request_dimensions = dimensions != self.dimensions;
        self.dimensions = dimensions;
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &EmbeddingRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model(),
            "input": request.inputs(),
            "input_type": request.input_type().as_str(),
        });

        if let Some(dims) = request.dimensions() {
            body["output_dimension"] = serde_json::json!(dims);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<EmbeddingResponse, DomainError> {
        let response: VoyageEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("voyage", format!("Failed to parse embedding response: {}", e))
        })?;

        let embeddings = response
            .data
            .into_iter()
            .map(|d| Embedding::new(d.index, d.embedding))
            .collect();

        Ok(EmbeddingResponse::new(response.model, embeddings))
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for VoyageEmbeddingProvider<C> {
    async fn embed_batch(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = EmbeddingRequest::new(&self.model, texts.to_vec(), input_type);
        if self.request_dimensions {
            request = request.with_dimensions(self.dimensions);
        }

        let response = self
            .client
            .post_json(&self.embeddings_url(), self.headers(), &self.build_request(&request))
            .await?;

        self.parse_response(response)?
            .into_vectors(self.provider_name(), texts.len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &'static str {
        "voyage"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct VoyageEmbeddingResponse {
    model: String,
    data: Vec<VoyageEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct VoyageEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}
