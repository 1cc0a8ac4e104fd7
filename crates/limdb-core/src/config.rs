//! Store configuration
//!
//! One [`LimdbConfig`] is loaded per process (usually from TOML) and passed
//! by reference to everything that needs a path or a projection switch.

#![allow(clippy::result_large_err)]

use crate::errors::{ExError, ExErrorKind};
use crate::reference::SnapshotRanges;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimdbConfig {
    /// Directory holding the revision archive and the store
    pub data_dir: PathBuf,
    /// Production store file name under `data_dir`
    pub store_file: String,
    /// Reference snapshot JSON; relative paths resolve under `data_dir`
    pub reference_file: PathBuf,
    /// First revision of a full rebuild
    pub baseline_file: String,
    /// Revision forced onto the baseline file
    pub baseline_revision: String,
    /// Archived revisions are `<prefix><major>.<minor>.dec`
    pub archive_prefix: String,
    pub discard_disabled_sets: bool,
    pub snapshot_ranges: SnapshotRanges,
    /// JSON log file receiving merge audit events
    pub commit_log: Option<PathBuf>,
}

impl Default for LimdbConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            store_file: "glimmondb.sqlite3".to_string(),
            reference_file: PathBuf::from("reference_snapshots.json"),
            baseline_file: "G_LIMMON_P007A.dec".to_string(),
            baseline_revision: "2.0".to_string(),
            archive_prefix: "G_LIMMON_".to_string(),
            discard_disabled_sets: true,
            snapshot_ranges: SnapshotRanges::default(),
            commit_log: None,
        }
    }
}

impl LimdbConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// `NotFound`/`Io` when the file cannot be read, `InvalidInput` when the
    /// TOML does not describe a valid configuration.
    pub fn from_file(path: &Path) -> Result<Self, ExError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            let kind = if e.kind() == std::io::ErrorKind::NotFound {
                ExErrorKind::NotFound
            } else {
                ExErrorKind::Io
            };
            ExError::new(kind)
                .with_op("load_config")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// `InvalidInput` for syntax errors, unknown keys or invalid snapshot ranges.
    pub fn from_toml(content: &str) -> Result<Self, ExError> {
        toml::from_str(content).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("load_config")
                .with_message(e.to_string())
        })
    }

    /// Check that the files a run depends on exist
    ///
    /// # Errors
    ///
    /// `NotFound` naming the first missing path.
    pub fn validate(&self) -> Result<(), ExError> {
        if !self.data_dir.is_dir() {
            return Err(not_found("data directory", &self.data_dir));
        }
        let reference = self.reference_path();
        if !reference.is_file() {
            return Err(not_found("reference snapshot file", &reference));
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    pub fn reference_path(&self) -> PathBuf {
        self.data_dir.join(&self.reference_file)
    }

    pub fn baseline_path(&self) -> PathBuf {
        self.data_dir.join(&self.baseline_file)
    }

    pub fn commit_log_path(&self) -> Option<PathBuf> {
        self.commit_log.as_ref().map(|p| self.data_dir.join(p))
    }
}

fn not_found(what: &str, path: &Path) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("validate_config")
        .with_message(format!("{} {} does not exist", what, path.display()))
}
