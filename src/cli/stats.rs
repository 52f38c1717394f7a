//! Stats command

use super::OutputArgs;

pub async fn run(args: OutputArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::warn_if_process_local(&config, "stats");

    let engine = super::create_engine(&config, None).await?;
    let stats = engine.stats().await;
    engine.close().await?;
    let stats = stats?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("entries:        {}", stats.total_entries);
    println!("hits:           {}", stats.total_hits);
    println!("hits per entry: {:.2}", stats.hits_per_entry());
    println!("approx size:    {} bytes", stats.approx_size_bytes);
    if let (Some(oldest), Some(newest)) = (stats.oldest_entry, stats.newest_entry) {
        println!("oldest entry:   {}", oldest.to_rfc3339());
        println!("newest entry:   {}", newest.to_rfc3339());
    }

    Ok(())
}
