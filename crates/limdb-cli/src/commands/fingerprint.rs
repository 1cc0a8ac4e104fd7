//! Fingerprint command

use super::{print_json, store_path};
use clap::Args;
use limdb_core::LimdbConfig;
use limdb_engine::fingerprint_store;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct FingerprintArgs {
    #[arg(long)]
    pub store: Option<PathBuf>,
}

pub fn execute(
    args: FingerprintArgs,
    config: &LimdbConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = fingerprint_store(&store_path(args.store, config))?;
    print_json(&record)
}
