//! CLI module for the semantic cache
//!
//! Provides subcommands to query and inspect the cache:
//! - `query`: answer a query, from the cache when possible
//! - `lookup`: probe the cache without calling the model
//! - `stats` / `clear`: inspect or empty the cache
//! - `fingerprint`: print the fingerprint of a response schema file
//!
//! The default `memory` index lives only as long as one process, so across
//! separate CLI runs only the `pgvector` backend keeps entries.

pub mod clear;
pub mod fingerprint;
pub mod lookup;
pub mod query;
pub mod stats;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::config::{AppConfig, IndexBackend};
use crate::domain::ResponseSchema;
use crate::infrastructure::logging;
use crate::infrastructure::services::SemanticCacheEngine;

/// PMP Semantic Cache - reuse LLM answers for semantically similar queries
#[derive(Parser)]
#[command(name = "pmp-semantic-cache")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "With the default `memory` index every run starts from an empty cache. \
Set `index.backend = \"pgvector\"` (or APP__INDEX__BACKEND=pgvector) to keep entries between runs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a query, calling the model only on a cache miss
    Query(query::QueryArgs),

    /// Check whether a query would hit the cache
    Lookup(lookup::LookupArgs),

    /// Show cache statistics
    Stats(OutputArgs),

    /// Remove every cache entry
    Clear,

    /// Print the fingerprint of a response schema file
    Fingerprint(fingerprint::FingerprintArgs),
}

/// Output formatting shared by commands
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Load `.env` and configuration, then install logging
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    config.validate()?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}

/// Build the engine, overriding the configured threshold when given
pub(crate) async fn create_engine(
    config: &AppConfig,
    threshold: Option<f32>,
) -> anyhow::Result<SemanticCacheEngine> {
    let engine = crate::create_engine(config).await?;

    if let Some(threshold) = threshold {
        engine.set_threshold(threshold)?;
        info!(threshold, "Using threshold override");
    }

    Ok(engine)
}

/// Warn when the configured index does not outlive this process.
/// Returns whether the warning was issued.
pub(crate) fn warn_if_process_local(config: &AppConfig, command: &str) -> bool {
    if config.index.backend != IndexBackend::Memory {
        return false;
    }

    warn!(
        command,
        "The memory index starts empty on every run; configure the pgvector backend to keep entries"
    );
    true
}

pub(crate) fn read_schema(path: &Path) -> anyhow::Result<ResponseSchema> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read schema file {}: {}", path.display(), e))?;

    Ok(ResponseSchema::from_json(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warns_only_for_memory_backend() {
        let mut config = AppConfig::default();
        assert!(warn_if_process_local(&config, "stats"));

        config.index.backend = IndexBackend::Pgvector;
        assert!(!warn_if_process_local(&config, "stats"));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_query_with_options() {
        let cli = Cli::try_parse_from([
            "pmp-semantic-cache",
            "query",
            "What is the capital of France?",
            "--schema",
            "capital.json",
            "--threshold",
            "0.9",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Command::Query(args) => {
                assert_eq!(args.text, "What is the capital of France?");
                assert_eq!(args.schema, Some(PathBuf::from("capital.json")));
                assert_eq!(args.threshold, Some(0.9));
                assert!(args.output.json);
            }
            _ => panic!("Expected query command"),
        }
    }

    #[test]
    fn test_parse_lookup_with_fingerprint() {
        let cli = Cli::try_parse_from([
            "pmp-semantic-cache",
            "lookup",
            "capital of France",
            "--fingerprint",
            "schema_0123456789abcdef",
        ])
        .unwrap();

        match cli.command {
            Command::Lookup(args) => {
                assert_eq!(args.fingerprint.as_deref(), Some("schema_0123456789abcdef"));
                assert!(args.threshold.is_none());
            }
            _ => panic!("Expected lookup command"),
        }
    }

    #[test]
    fn test_parse_simple_commands() {
        assert!(matches!(
            Cli::try_parse_from(["pmp-semantic-cache", "clear"]).unwrap().command,
            Command::Clear
        ));
        assert!(matches!(
            Cli::try_parse_from(["pmp-semantic-cache", "stats", "--json"]).unwrap().command,
            Command::Stats(OutputArgs { json: true })
        ));
        assert!(Cli::try_parse_from(["pmp-semantic-cache", "query"]).is_err());
    }

    #[test]
    fn test_read_schema_missing_file() {
        assert!(read_schema(Path::new("/nonexistent/schema.json")).is_err());
    }
}
