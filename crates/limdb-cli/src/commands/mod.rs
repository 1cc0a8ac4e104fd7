//! Subcommand implementations

pub mod fingerprint;
pub mod history;
pub mod merge;
pub mod rebuild;
pub mod verify;

use limdb_core::errors::ExError;
use limdb_core::{LimdbConfig, ReferenceSet};
use limdb_store::reference::load_reference_snapshots;
use serde::Serialize;
use std::path::PathBuf;

/// `--store` when given, the configured store otherwise
fn store_path(arg: Option<PathBuf>, config: &LimdbConfig) -> PathBuf {
    arg.unwrap_or_else(|| config.store_path())
}

fn load_reference(config: &LimdbConfig) -> Result<ReferenceSet, ExError> {
    config.validate()?;
    load_reference_snapshots(&config.reference_path())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
