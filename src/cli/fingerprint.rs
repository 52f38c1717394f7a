//! Fingerprint command - offline, needs no configuration

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct FingerprintArgs {
    /// JSON file describing a response schema
    pub file: PathBuf,
}

pub fn run(args: FingerprintArgs) -> anyhow::Result<()> {
    let schema = super::read_schema(&args.file)?;
    println!("{}", schema.fingerprint());
    Ok(())
}
