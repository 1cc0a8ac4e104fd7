//! limdb CLI
//!
//! Command-line interface for the limit-monitor history store

use clap::{Parser, Subcommand, ValueEnum};
use limdb_core::errors::{ExError, ExErrorKind};
use limdb_core::logging_facility::{init, init_with_log_file, Profile};
use limdb_core::LimdbConfig;
use std::error::Error;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "limdb")]
#[command(about = "limdb - Limit and expected-state history store", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Console log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rebuild the store from the baseline and every archived revision
    Rebuild(commands::rebuild::RebuildArgs),
    /// Merge one revision file into the existing store
    Merge(commands::merge::MergeArgs),
    /// Recompute the ledger row of the store's latest version
    Fingerprint(commands::fingerprint::FingerprintArgs),
    /// Rebuild twice in scratch space and compare every ledger row
    Verify(commands::verify::VerifyArgs),
    /// Show the stored history of one msid
    History(commands::history::HistoryArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => LimdbConfig::from_file(path)?,
        None => LimdbConfig::default(),
    };

    let profile = match cli.log_format {
        LogFormat::Pretty => Profile::Development,
        LogFormat::Json => Profile::Production,
    };
    match config.commit_log_path() {
        Some(path) => init_with_log_file(profile, &path)?,
        None => init(profile),
    }

    match cli.command {
        Commands::Rebuild(args) => commands::rebuild::execute(args, &config),
        Commands::Merge(args) => commands::merge::execute(args, &config),
        Commands::Fingerprint(args) => commands::fingerprint::execute(args, &config),
        Commands::Verify(args) => commands::verify::execute(args, &config),
        Commands::History(args) => commands::history::execute(args, &config),
    }
}

/// Reproducibility failures exit with 2, everything else with 1
fn exit_code(e: &(dyn Error + 'static)) -> i32 {
    match e.downcast_ref::<ExError>() {
        Some(err) if err.kind() == ExErrorKind::DeterminismViolation => 2,
        _ => 1,
    }
}
