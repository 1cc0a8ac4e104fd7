//! Reproducibility check command

use super::{load_reference, print_json};
use clap::Args;
use limdb_core::errors::{ExError, ExErrorKind};
use limdb_core::LimdbConfig;
use limdb_engine::{rebuild_plan, verify_reproducible, MergeContext};
use limdb_store::db;
use limdb_store::fingerprint::latest_fingerprint;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Also require this store's latest ledger row to match the rebuild
    #[arg(long)]
    pub against: Option<PathBuf>,
}

pub fn execute(args: VerifyArgs, config: &LimdbConfig) -> Result<(), Box<dyn std::error::Error>> {
    let reference = load_reference(config)?;
    let ctx = MergeContext::from_config(config, &reference);
    let plan = rebuild_plan(config)?;

    let report = verify_reproducible(&plan, &ctx)?;

    if let Some(store) = args.against {
        let conn = db::open_read_only(&store)?;
        let stored = latest_fingerprint(&conn)?.ok_or_else(|| {
            ExError::new(ExErrorKind::NotFound)
                .with_op("verify_against_store")
                .with_message(format!("{} has no ledger rows", store.display()))
        })?;
        let matches = stored.version == report.version
            && stored.limit_hash == report.limit_hash
            && stored.state_hash == report.state_hash
            && stored.version_hash == report.version_hash;
        if !matches {
            return Err(ExError::new(ExErrorKind::DeterminismViolation)
                .with_op("verify_against_store")
                .with_message(format!(
                    "{} (version {}) does not match a fresh rebuild (version {})",
                    store.display(),
                    stored.version,
                    report.version
                ))
                .into());
        }
    }

    print_json(&report)
}
