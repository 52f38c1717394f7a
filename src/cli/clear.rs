//! Clear command

pub async fn run() -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::warn_if_process_local(&config, "clear");

    let engine = super::create_engine(&config, None).await?;
    let removed = engine.clear().await;
    engine.close().await?;

    println!("Removed {} entries", removed?);
    Ok(())
}
