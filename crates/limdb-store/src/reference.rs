//! Reference snapshot loading
//!
//! The snapshot file is one JSON object mapping snapshot ids to objects
//! keyed by msid; see [`limdb_core::reference::ReferenceEntry`].

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, not_found, serialization_error, Result};
use limdb_core::reference::ReferenceSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load every reference snapshot from a JSON file
///
/// # Errors
///
/// `NotFound` when the file is missing, `Serialization` when it is not a
/// valid snapshot document.
pub fn load_reference_snapshots(path: &Path) -> Result<ReferenceSet> {
    if !path.is_file() {
        return Err(not_found("load_reference", "reference snapshot file", path));
    }
    let file = File::open(path).map_err(|e| io_error("load_reference", e))?;
    let set: ReferenceSet = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| serialization_error("load_reference", e))?;
    tracing::info!(
        path = %path.display(),
        snapshots = set.ids().count(),
        "Loaded reference snapshots"
    );
    Ok(set)
}
