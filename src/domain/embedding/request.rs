//! Embedding request types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hint telling the embedding service how the text will be used.
///
/// Asymmetric embedding models encode search queries and stored documents
/// differently; providers without that distinction ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Text is a lookup query
    #[default]
    Query,
    /// Text is content being indexed
    Document,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Query => "query",
            InputType::Document => "document",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to generate embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model to use for embedding
    model: String,
    /// Input texts to embed, in order
    input: Vec<String>,
    /// Usage hint for asymmetric models
    input_type: InputType,
    /// Optional dimensions (for models that support it)
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl EmbeddingRequest {
    /// Create a new embedding request
    pub fn new(model: impl Into<String>, input: Vec<String>, input_type: InputType) -> Self {
        Self {
            model: model.into(),
            input,
            input_type,
            dimensions: None,
        }
    }

    /// Create a request for a single text
    pub fn single(model: impl Into<String>, text: impl Into<String>, input_type: InputType) -> Self {
        Self::new(model, vec![text.into()], input_type)
    }

    /// Set the output dimensions
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn inputs(&self) -> &[String] {
        &self.input
    }

    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}
