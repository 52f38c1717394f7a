//! Query command - answer from the cache or the model

use std::path::PathBuf;

use clap::Args;

use super::OutputArgs;
use crate::domain::QueryResult;

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Query text
    pub text: String,

    /// JSON file describing the expected response schema
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Similarity threshold override, within [0, 1]
    #[arg(long)]
    pub threshold: Option<f32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::warn_if_process_local(&config, "query");
    let schema = args.schema.as_deref().map(super::read_schema).transpose()?;

    let engine = super::create_engine(&config, args.threshold).await?;
    let result = engine.query(&args.text, schema.as_ref()).await;
    engine.close().await?;
    let result = result?;

    if args.output.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.response);
        eprintln!("{}", summary(&result));
    }

    Ok(())
}

fn summary(result: &QueryResult) -> String {
    let mut line = match result.similarity_score {
        Some(score) => format!("source=cache score={:.4}", score),
        None => "source=completion".to_string(),
    };

    line.push_str(&format!(" time={}ms", result.total_time_ms));
    if let Some(saved) = result.time_saved_ms {
        line.push_str(&format!(" saved={}ms", saved));
    }

    line
}
