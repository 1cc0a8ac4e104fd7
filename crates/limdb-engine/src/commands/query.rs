//! Read-only queries against a store file, plus on-demand fingerprinting

#![allow(clippy::result_large_err)]

use crate::commands::merge::stamp_file_digest;
use limdb_core::model::TableKind;
use limdb_core::projection::AnyRow;
use limdb_store::db;
use limdb_store::errors::Result;
use limdb_store::fingerprint::{compute_fingerprints, latest_fingerprint};
use limdb_store::repo::{history_any, in_effect_any, max_version};
use limdb_store::{FingerprintRecord, SourceInfo};
use std::path::Path;

/// Every stored row of `msid` in one table, oldest first
pub fn history(store_path: &Path, msid: &str, kind: TableKind) -> Result<Vec<AnyRow>> {
    let conn = db::open_existing(store_path)?;
    history_any(&conn, kind, msid)
}

/// Rows of `msid` in effect at `datesec`, one per set
pub fn in_effect_at(
    store_path: &Path,
    msid: &str,
    kind: TableKind,
    datesec: f64,
) -> Result<Vec<AnyRow>> {
    let conn = db::open_existing(store_path)?;
    in_effect_any(&conn, kind, msid, datesec)
}

/// Recompute the ledger row of the store's latest version
///
/// Source columns are carried over from the existing ledger row.
pub fn fingerprint_store(store_path: &Path) -> Result<FingerprintRecord> {
    let conn = db::open_existing(store_path)?;
    let latest_version = max_version(&conn)?;
    let source = match latest_fingerprint(&conn)? {
        Some(record) if Some(record.version) == latest_version => SourceInfo {
            file: record.source_file,
            revision: record.source_revision,
            date: record.source_date,
        },
        _ => SourceInfo::default(),
    };
    let mut record = compute_fingerprints(&conn, &source)?;
    stamp_file_digest(&conn, store_path, &mut record)?;
    Ok(record)
}
