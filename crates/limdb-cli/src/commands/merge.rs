//! Incremental merge command

use super::{load_reference, print_json, store_path};
use clap::Args;
use limdb_core::LimdbConfig;
use limdb_engine::{merge_revision_file, MergeContext, RevisionInput};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Revision file to merge
    pub file: PathBuf,

    /// Force the revision instead of reading `$Revision` from the file
    #[arg(long)]
    pub revision: Option<String>,

    #[arg(long)]
    pub store: Option<PathBuf>,
}

pub fn execute(args: MergeArgs, config: &LimdbConfig) -> Result<(), Box<dyn std::error::Error>> {
    let reference = load_reference(config)?;
    let ctx = MergeContext::from_config(config, &reference);

    let mut input = RevisionInput::new(args.file);
    if let Some(revision) = args.revision {
        input = input.with_revision(revision);
    }

    let outcome = merge_revision_file(&store_path(args.store, config), &input, &ctx)?;
    print_json(&outcome)
}
