mod app_config;

pub use app_config::{
    AppConfig, CompletionConfig, EmbeddingConfig, EmbeddingProviderKind, IndexBackend,
    IndexConfig, LogFormat, LoggingConfig,
};
