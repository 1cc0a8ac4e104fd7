//! Full rebuild from the baseline and the archive
//!
//! The store is built in a staging file beside the target and renamed over
//! it only when every revision has merged.

#![allow(clippy::result_large_err)]

use crate::archive::RevisionInput;
use crate::commands::merge::{merge_prepared, stamp_file_digest, MergeOutcome};
use crate::pipeline::{prepare_revision, MergeContext};
use limdb_core::errors::{ExError, ExErrorKind};
use limdb_core::{log_op_end, log_op_error, log_op_start};
use limdb_store::atomic::{atomic_replace, discard_staging, staging_path};
use limdb_store::db;
use limdb_store::errors::Result;
use limdb_store::migrations::apply_migrations;
use limdb_store::FingerprintRecord;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebuildOutcome {
    /// One entry per replayed revision, in replay order
    pub revisions: Vec<MergeOutcome>,
}

impl RebuildOutcome {
    /// Ledger row of the last replayed revision
    pub fn fingerprint(&self) -> Option<&FingerprintRecord> {
        self.revisions.last().map(|outcome| &outcome.fingerprint)
    }
}

/// Replay `inputs` in order into a fresh store and move it to `store_path`
///
/// # Errors
///
/// `InvalidInput` for an empty input list; otherwise the first failing
/// revision's error. The existing store is left untouched on failure.
pub fn rebuild_from_scratch(
    inputs: &[RevisionInput],
    store_path: &Path,
    ctx: &MergeContext<'_>,
) -> Result<RebuildOutcome> {
    log_op_start!("rebuild_from_scratch", revisions = inputs.len());
    let start = std::time::Instant::now();

    let staging = staging_path(store_path);
    let result = rebuild_impl(inputs, &staging, ctx)
        .and_then(|outcome| atomic_replace(&staging, store_path).map(|()| outcome));

    match result {
        Ok(outcome) => {
            log_op_end!(
                "rebuild_from_scratch",
                duration_ms = start.elapsed().as_millis() as u64,
                revisions = outcome.revisions.len()
            );
            Ok(outcome)
        }
        Err(e) => {
            if let Err(cleanup) = discard_staging(&staging) {
                tracing::warn!(error = %cleanup, "Could not remove staging store");
            }
            log_op_error!(
                "rebuild_from_scratch",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            Err(e)
        }
    }
}

fn rebuild_impl(
    inputs: &[RevisionInput],
    staging: &Path,
    ctx: &MergeContext<'_>,
) -> Result<RebuildOutcome> {
    if inputs.is_empty() {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("rebuild_from_scratch")
            .with_message("no revisions to replay"));
    }
    discard_staging(staging)?;

    let mut conn = db::open(staging)?;
    db::configure(&conn)?;
    apply_migrations(&mut conn)?;

    let mut revisions = Vec::with_capacity(inputs.len());
    for input in inputs {
        let text = input.read_text()?;
        let prepared = prepare_revision(
            &text,
            input.file_name().as_deref(),
            input.revision_override.as_deref(),
            ctx,
        )?;
        let mut outcome = merge_prepared(&mut conn, prepared)?;
        stamp_file_digest(&conn, staging, &mut outcome.fingerprint)?;
        revisions.push(outcome);
    }

    Ok(RebuildOutcome { revisions })
}
