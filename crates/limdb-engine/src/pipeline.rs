//! Parse → default → stamp → project for one revision

#![allow(clippy::result_large_err)]

use limdb_core::errors::ExError;
use limdb_core::projection::RowStamp;
use limdb_core::reference::{ReferenceDefaulter, ReferenceSource, SnapshotRanges};
use limdb_core::{parse_revision, project, LimdbConfig, Projection};
use limdb_store::errors::Result;
use limdb_store::SourceInfo;

/// Everything a merge needs besides the store
#[derive(Clone, Copy)]
pub struct MergeContext<'a> {
    pub ranges: &'a SnapshotRanges,
    pub reference: &'a dyn ReferenceSource,
    pub discard_disabled: bool,
}

impl<'a> MergeContext<'a> {
    pub fn from_config(config: &'a LimdbConfig, reference: &'a dyn ReferenceSource) -> Self {
        Self {
            ranges: &config.snapshot_ranges,
            reference,
            discard_disabled: config.discard_disabled_sets,
        }
    }
}

/// One revision ready to merge
#[derive(Debug, Clone)]
pub struct PreparedRevision {
    pub revision: String,
    pub stamp: RowStamp,
    pub projection: Projection,
    pub source: SourceInfo,
}

/// Parse revision text and run it through the defaulter and projector
///
/// `revision_override` replaces the file's own `$Revision` (the baseline
/// file is always processed as its configured revision).
///
/// # Errors
///
/// Structural parse errors, missing metadata, or an unloaded snapshot.
pub fn prepare_revision(
    text: &str,
    source_file: Option<&str>,
    revision_override: Option<&str>,
    ctx: &MergeContext<'_>,
) -> Result<PreparedRevision> {
    let mut parsed = parse_revision(text)?;
    if let Some(revision) = revision_override {
        parsed.override_revision(revision);
    }

    ReferenceDefaulter::new(ctx.ranges, ctx.reference)
        .apply(&mut parsed)
        .map_err(ExError::from)?;
    let stamp = parsed.stamp()?;
    let projection = project(&parsed, &stamp, ctx.discard_disabled);

    let revision = parsed.revision.clone().unwrap_or_default();
    Ok(PreparedRevision {
        source: SourceInfo {
            file: source_file.map(str::to_string),
            revision: Some(revision.clone()),
            date: Some(stamp.date.clone()),
        },
        revision,
        stamp,
        projection,
    })
}
