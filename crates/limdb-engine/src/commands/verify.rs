//! Reproducibility check: two independent rebuilds must agree

#![allow(clippy::result_large_err)]

use crate::archive::RevisionInput;
use crate::commands::rebuild::rebuild_from_scratch;
use crate::pipeline::MergeContext;
use limdb_core::errors::{ExError, ExErrorKind};
use limdb_core::{log_op_end, log_op_error, log_op_start};
use limdb_store::errors::{io_error, Result};
use limdb_store::FingerprintRecord;
use serde::Serialize;

const SCRATCH_STORE: &str = "glimmondb.sqlite3";

/// Table digests both rebuilds agreed on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyReport {
    pub revisions: usize,
    pub version: i64,
    pub limit_hash: String,
    pub state_hash: String,
    pub version_hash: String,
    pub limit_count: i64,
    pub state_count: i64,
    pub version_count: i64,
}

/// Rebuild twice into scratch directories and compare every ledger row
///
/// # Errors
///
/// `DeterminismViolation` when any version's table digests or counts differ,
/// plus any rebuild error.
pub fn verify_reproducible(
    inputs: &[RevisionInput],
    ctx: &MergeContext<'_>,
) -> Result<VerifyReport> {
    log_op_start!("verify_reproducible", revisions = inputs.len());
    let start = std::time::Instant::now();

    let result = verify_impl(inputs, ctx).map_err(|e| {
        log_op_error!(
            "verify_reproducible",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "verify_reproducible",
        duration_ms = start.elapsed().as_millis() as u64
    );
    Ok(result)
}

fn verify_impl(inputs: &[RevisionInput], ctx: &MergeContext<'_>) -> Result<VerifyReport> {
    let first_dir = tempfile::tempdir().map_err(|e| io_error("verify_scratch_dir", e))?;
    let second_dir = tempfile::tempdir().map_err(|e| io_error("verify_scratch_dir", e))?;

    let first = rebuild_from_scratch(inputs, &first_dir.path().join(SCRATCH_STORE), ctx)?;
    let second = rebuild_from_scratch(inputs, &second_dir.path().join(SCRATCH_STORE), ctx)?;

    for (a, b) in first.revisions.iter().zip(second.revisions.iter()) {
        check_same(&a.fingerprint, &b.fingerprint)?;
    }

    let last = first.fingerprint().ok_or_else(|| {
        ExError::new(ExErrorKind::Internal)
            .with_op("verify_reproducible")
            .with_message("rebuild produced no ledger rows")
    })?;
    Ok(VerifyReport {
        revisions: first.revisions.len(),
        version: last.version,
        limit_hash: last.limit_hash.clone(),
        state_hash: last.state_hash.clone(),
        version_hash: last.version_hash.clone(),
        limit_count: last.limit_count,
        state_count: last.state_count,
        version_count: last.version_count,
    })
}

fn check_same(a: &FingerprintRecord, b: &FingerprintRecord) -> Result<()> {
    if a.version == b.version && a.same_tables(b) {
        return Ok(());
    }
    Err(ExError::new(ExErrorKind::DeterminismViolation)
        .with_op("verify_reproducible")
        .with_message(format!(
            "version {} rebuilt twice with different tables: \
             limits {}/{} vs {}/{}, states {}/{} vs {}/{}",
            a.version,
            a.limit_hash,
            a.limit_count,
            b.limit_hash,
            b.limit_count,
            a.state_hash,
            a.state_count,
            b.state_hash,
            b.state_count
        )))
}
