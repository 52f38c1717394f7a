//! Lookup command - probe the cache without calling the model

use clap::Args;

use super::OutputArgs;

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    /// Query text
    pub text: String,

    /// Only match entries stored under this schema fingerprint (or none)
    #[arg(long)]
    pub fingerprint: Option<String>,

    /// Similarity threshold override, within [0, 1]
    #[arg(long)]
    pub threshold: Option<f32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run(args: LookupArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::warn_if_process_local(&config, "lookup");

    let engine = super::create_engine(&config, args.threshold).await?;
    let result = engine
        .lookup(&args.text, None, args.fingerprint.as_deref())
        .await;
    engine.close().await?;
    let result = result?;

    if args.output.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match (&result.response, result.score) {
        (Some(response), Some(score)) => println!("hit score={:.4}\n{}", score, response),
        (_, Some(score)) => println!("miss best_score={:.4}", score),
        _ => println!("miss (no candidates)"),
    }

    Ok(())
}
