//! Embedding provider implementations

mod openai;
mod voyage;

pub use openai::{model_dimensions, OpenAiEmbeddingProvider};
pub use voyage::VoyageEmbeddingProvider;

// Re-export HTTP client for use by embedding providers
pub use super::llm::{HttpClient, HttpClientTrait};
