//! Revision archive discovery
//!
//! Archived revisions sit next to the store as `<prefix><major>.<minor>.dec`
//! and are replayed in numeric `(major, minor)` order after the baseline.

#![allow(clippy::result_large_err)]

use limdb_core::errors::{ExError, ExErrorKind};
use limdb_core::LimdbConfig;
use limdb_store::errors::{io_error, not_found, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// One revision file to replay, with an optional forced revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionInput {
    pub path: PathBuf,
    pub revision_override: Option<String>,
}

impl RevisionInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            revision_override: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision_override = Some(revision.into());
        self
    }

    /// File name used as the ledger's source file
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Read the revision text (lossily decoded; the archive predates UTF-8)
    pub fn read_text(&self) -> Result<String> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            let message = format!("{}: {}", self.path.display(), e);
            io_error("read_revision", e).with_message(message)
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Archived revision files under `data_dir`, in numeric revision order
///
/// # Errors
///
/// `NotFound` when `data_dir` does not exist.
pub fn discover_archive(data_dir: &Path, prefix: &str) -> Result<Vec<RevisionInput>> {
    let source = format!(r"^{}(\d+)\.(\d+)\.dec$", regex::escape(prefix));
    let pattern = Regex::new(&source).map_err(|e| {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("discover_archive")
            .with_message(e.to_string())
    })?;
    if !data_dir.is_dir() {
        return Err(not_found("discover_archive", "data directory", data_dir));
    }

    let mut found: Vec<(u64, u64, PathBuf)> = Vec::new();
    let entries = std::fs::read_dir(data_dir).map_err(|e| io_error("discover_archive", e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_error("discover_archive", e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(caps) = pattern.captures(&name) else {
            continue;
        };
        let (Ok(major), Ok(minor)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) else {
            continue;
        };
        found.push((major, minor, entry.path()));
    }
    found.sort();

    tracing::debug!(count = found.len(), "Discovered archived revisions");
    Ok(found
        .into_iter()
        .map(|(_, _, path)| RevisionInput::new(path))
        .collect())
}

/// Baseline followed by the archive, as replayed by a full rebuild
///
/// # Errors
///
/// `NotFound` when the data directory or the baseline file is missing.
pub fn rebuild_plan(config: &LimdbConfig) -> Result<Vec<RevisionInput>> {
    let baseline = config.baseline_path();
    if !baseline.is_file() {
        return Err(not_found("rebuild_plan", "baseline revision", &baseline));
    }
    let mut plan = vec![RevisionInput::new(baseline).with_revision(&config.baseline_revision)];
    plan.extend(discover_archive(&config.data_dir, &config.archive_prefix)?);
    Ok(plan)
}
