//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility.

use crate::errors::{ExError, ExErrorKind};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

static INIT_ONCE: Once = Once::new();

fn default_filter(profile: Profile) -> EnvFilter {
    let fallback = match profile {
        Profile::Development => "limdb=debug",
        Profile::Production | Profile::Test => "limdb=info",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Initialize the logging facility
///
/// Console output goes to stderr so command results on stdout stay
/// machine-readable. `RUST_LOG` overrides the profile's default filter.
///
/// # Example
///
/// ```
/// use limdb_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| install(profile, None));
}

/// Initialize the logging facility and append every event as JSON to `path`
///
/// The file is the merge audit trail: one JSON object per line, carrying the
/// same fields as the console output.
///
/// # Errors
///
/// Returns an `Io` error when the log file cannot be opened for appending.
pub fn init_with_log_file(profile: Profile, path: &Path) -> Result<(), ExError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("open_commit_log")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
    INIT_ONCE.call_once(|| install(profile, Some(file)));
    Ok(())
}

fn install(profile: Profile, log_file: Option<File>) {
    if profile == Profile::Test {
        // Test capture is initialized separately via init_test_capture()
        tracing_subscriber::registry().init();
        return;
    }

    let pretty = (profile == Profile::Development)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let json = (profile == Profile::Production)
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let file = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(default_filter(profile))
        .with(pretty)
        .with(json)
        .with(file)
        .init();
}
