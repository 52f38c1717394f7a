//! Concrete collaborators and services

pub mod embedding;
pub mod llm;
pub mod logging;
pub mod semantic_cache;
pub mod services;
pub mod telemetry;
