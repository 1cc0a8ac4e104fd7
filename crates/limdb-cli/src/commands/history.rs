//! History query command

use super::{print_json, store_path};
use clap::Args;
use limdb_core::model::TableKind;
use limdb_core::LimdbConfig;
use limdb_engine::{history, in_effect_at};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub msid: String,

    /// `limit` or `expected_state`
    #[arg(long, default_value = "limit")]
    pub table: String,

    /// Only the rows in effect at this mission time (seconds)
    #[arg(long)]
    pub at: Option<f64>,

    #[arg(long)]
    pub store: Option<PathBuf>,
}

pub fn execute(args: HistoryArgs, config: &LimdbConfig) -> Result<(), Box<dyn std::error::Error>> {
    let kind: TableKind = args.table.parse()?;
    let store = store_path(args.store, config);

    let rows = match args.at {
        Some(datesec) => in_effect_at(&store, &args.msid, kind, datesec)?,
        None => history(&store, &args.msid, kind)?,
    };
    print_json(&rows)
}
