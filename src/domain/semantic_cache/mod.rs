//! Semantic cache domain models and traits
//!
//! Provides vector-based caching that matches semantically similar queries
//! rather than requiring exact key matches.

mod config;
mod entry;
mod repository;
mod result;
mod search;

pub use config::{validate_threshold, SemanticCacheConfig};
pub use entry::CacheEntry;
pub use repository::{CacheStats, SemanticSearchResult, VectorIndex};
pub use result::{Answer, LookupResult, QueryResult};
pub use search::{CandidatePolicy, SearchPlan};
