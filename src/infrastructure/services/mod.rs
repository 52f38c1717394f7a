//! Application services

mod semantic_cache_engine;

pub use semantic_cache_engine::{SemanticCacheEngine, DEFAULT_SIMILARITY_THRESHOLD};
