//! Full rebuild command

use super::{load_reference, print_json, store_path};
use clap::Args;
use limdb_core::LimdbConfig;
use limdb_engine::{rebuild_from_scratch, rebuild_plan, MergeContext};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RebuildArgs {
    /// Store file to replace (defaults to the configured store)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Print one summary per replayed revision
    #[arg(long)]
    pub per_revision: bool,
}

#[derive(Serialize)]
struct RevisionSummary<'a> {
    version: i64,
    revision: &'a str,
    date: &'a str,
    limits: limdb_core::DeltaCounts,
    states: limdb_core::DeltaCounts,
}

pub fn execute(args: RebuildArgs, config: &LimdbConfig) -> Result<(), Box<dyn std::error::Error>> {
    let reference = load_reference(config)?;
    let ctx = MergeContext::from_config(config, &reference);
    let plan = rebuild_plan(config)?;
    let store = store_path(args.store, config);

    let outcome = rebuild_from_scratch(&plan, &store, &ctx)?;

    if args.per_revision {
        let summaries: Vec<RevisionSummary<'_>> = outcome
            .revisions
            .iter()
            .map(|r| RevisionSummary {
                version: r.version,
                revision: &r.revision,
                date: &r.date,
                limits: r.limits,
                states: r.states,
            })
            .collect();
        print_json(&summaries)?;
    }
    print_json(&outcome.fingerprint())
}
