use clap::Parser;
use pmp_semantic_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Query(args) => cli::query::run(args).await,
        Command::Lookup(args) => cli::lookup::run(args).await,
        Command::Stats(args) => cli::stats::run(args).await,
        Command::Clear => cli::clear::run().await,
        Command::Fingerprint(args) => cli::fingerprint::run(args),
    }
}
