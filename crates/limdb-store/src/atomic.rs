//! Atomic store replacement
//!
//! A full rebuild writes into a staging file next to the production store
//! and renames it into place, so readers never see a half-built store.

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const STAGING_SUFFIX: &str = ".rebuild.tmp";

/// Staging location for a rebuild of `target`: same directory, full file
/// name plus a suffix, so it never coincides with `target` itself
pub fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(STAGING_SUFFIX);
    target.with_file_name(name)
}

/// Remove a leftover staging file from an interrupted rebuild
pub fn discard_staging(staging: &Path) -> Result<()> {
    match fs::remove_file(staging) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error("discard_staging", e)),
    }
}

/// Atomically move a finished staging file over `target`
pub fn atomic_replace(staging: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_store_dir", e))?;
    }
    fs::rename(staging, target).map_err(|e| io_error("replace_store", e))?;
    Ok(())
}
