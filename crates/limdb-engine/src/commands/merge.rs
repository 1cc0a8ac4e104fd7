//! Incremental merge of one revision into an existing store
//!
//! The three passes for both tables, the `versions` row and the ledger row
//! are written in one transaction. The store-file digest is filled in after
//! commit, when the bytes on disk are final.

#![allow(clippy::result_large_err)]

use crate::archive::RevisionInput;
use crate::pipeline::{prepare_revision, MergeContext, PreparedRevision};
use limdb_core::errors::{ExError, ExErrorKind};
use limdb_core::projection::{LimitColumns, StateColumns};
use limdb_core::{log_op_end, log_op_error, log_op_start, merge_table, DeltaCounts, TableDelta};
use limdb_store::db;
use limdb_store::errors::{from_rusqlite, Result};
use limdb_store::fingerprint::{compute_fingerprints, file_digest, record_file_digest};
use limdb_store::repo::{current_view, insert_rows, insert_version, max_version, StoredColumns};
use limdb_store::FingerprintRecord;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// What one merge wrote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    pub version: i64,
    pub revision: String,
    pub date: String,
    pub limits: DeltaCounts,
    pub states: DeltaCounts,
    /// Enabled entities left out for lack of any limit or state data
    pub untyped: Vec<String>,
    pub fingerprint: FingerprintRecord,
}

/// Merge revision text into an open store
///
/// # Errors
///
/// Parse/metadata errors, `StaleRevision` when the revision is not newer
/// than the store, and persistence failures. Nothing is written on error.
pub fn merge_one_revision(
    conn: &mut Connection,
    text: &str,
    ctx: &MergeContext<'_>,
) -> Result<MergeOutcome> {
    let prepared = prepare_revision(text, None, None, ctx)?;
    merge_prepared(conn, prepared)
}

/// Merge a revision file into the store file at `store_path`
///
/// # Errors
///
/// `NotFound` when the store or the revision file is missing, plus the
/// errors of [`merge_one_revision`].
pub fn merge_revision_file(
    store_path: &Path,
    input: &RevisionInput,
    ctx: &MergeContext<'_>,
) -> Result<MergeOutcome> {
    let mut conn = db::open_existing(store_path)?;
    let text = input.read_text()?;
    let prepared = prepare_revision(
        &text,
        input.file_name().as_deref(),
        input.revision_override.as_deref(),
        ctx,
    )?;
    let mut outcome = merge_prepared(&mut conn, prepared)?;
    stamp_file_digest(&conn, store_path, &mut outcome.fingerprint)?;
    Ok(outcome)
}

/// Merge an already prepared revision in one transaction
pub fn merge_prepared(conn: &mut Connection, prepared: PreparedRevision) -> Result<MergeOutcome> {
    let revision = prepared.revision.clone();
    log_op_start!("merge_one_revision", revision = revision);
    let start = std::time::Instant::now();

    let result = merge_prepared_impl(conn, prepared).map_err(|e| {
        log_op_error!(
            "merge_one_revision",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            revision = revision
        );
        e
    })?;

    log_op_end!(
        "merge_one_revision",
        duration_ms = start.elapsed().as_millis() as u64,
        modversion = result.version
    );
    Ok(result)
}

fn merge_prepared_impl(conn: &mut Connection, prepared: PreparedRevision) -> Result<MergeOutcome> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    let stamp = &prepared.stamp;

    if let Some(latest) = max_version(&tx)? {
        if stamp.modversion <= latest {
            return Err(ExError::new(ExErrorKind::StaleRevision)
                .with_op("merge_one_revision")
                .with_message(format!(
                    "revision {} (version {}) is not newer than stored version {}",
                    prepared.revision, stamp.modversion, latest
                )));
        }
    }

    let limits = merge_table(
        &prepared.projection.limits,
        &current_view::<LimitColumns>(&tx)?,
        stamp,
    );
    let states = merge_table(
        &prepared.projection.states,
        &current_view::<StateColumns>(&tx)?,
        stamp,
    );
    write_delta(&tx, &limits)?;
    write_delta(&tx, &states)?;
    insert_version(&tx, stamp)?;
    let fingerprint = compute_fingerprints(&tx, &prepared.source)?;

    tx.commit().map_err(from_rusqlite)?;

    Ok(MergeOutcome {
        version: stamp.modversion,
        revision: prepared.revision.clone(),
        date: stamp.date.clone(),
        limits: limits.counts(),
        states: states.counts(),
        untyped: prepared.projection.untyped.clone(),
        fingerprint,
    })
}

fn write_delta<V: StoredColumns>(conn: &Connection, delta: &TableDelta<V>) -> Result<usize> {
    Ok(insert_rows(conn, &delta.added)?
        + insert_rows(conn, &delta.deactivated)?
        + insert_rows(conn, &delta.modified)?)
}

/// Hash the committed store file into the ledger row just written
pub(crate) fn stamp_file_digest(
    conn: &Connection,
    store_path: &Path,
    fingerprint: &mut FingerprintRecord,
) -> Result<()> {
    let (hash, size) = file_digest(store_path)?;
    record_file_digest(conn, fingerprint.version, &hash, size)?;
    fingerprint.db_hash = Some(hash);
    fingerprint.db_size_bytes = Some(size);
    Ok(())
}
