//! Domain layer - Core cache logic, entities and collaborator contracts

pub mod completion;
pub mod embedding;
pub mod error;
pub mod schema;
pub mod semantic_cache;

pub use completion::CompletionProvider;
pub use embedding::{cosine_similarity, EmbeddingProvider, InputType};
pub use error::DomainError;
pub use schema::{fingerprint, ResponseSchema};
pub use semantic_cache::{
    Answer, CacheEntry, CacheStats, CandidatePolicy, LookupResult, QueryResult, SearchPlan,
    SemanticCacheConfig, SemanticSearchResult, VectorIndex,
};
