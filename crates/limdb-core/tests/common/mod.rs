use limdb_core::model::revision::RowStamp;
use limdb_core::reference::{
    ReferenceEntry, ReferenceLimitSet, ReferenceSnapshot, SnapshotRange, SnapshotRanges,
};
use limdb_core::{
    parse_revision, project, ParsedRevision, Projection, ReferenceDefaulter, ReferenceSet,
};
use std::collections::BTreeMap;

/// Revision text with `$Revision`/`$Date` headers followed by `body`
#[allow(dead_code)]
pub fn revision_text(revision: &str, date: &str, body: &str) -> String {
    format!(
        "# $Revision: {} $\n# $Date: {} $\nMLMDEFTOL 1\n{}",
        revision, date, body
    )
}

/// Ranges sending every revision to the snapshot `ref`
#[allow(dead_code)]
pub fn single_range() -> SnapshotRanges {
    SnapshotRanges::new(vec![SnapshotRange::new(None, "ref")]).unwrap()
}

/// A reference set with one snapshot `ref` giving `msid` the listed limit sets
#[allow(dead_code)]
pub fn reference_with_limits(msid: &str, sets: &[[f64; 4]]) -> ReferenceSet {
    let mut limit = BTreeMap::new();
    for (i, [wl, cl, ch, wh]) in sets.iter().enumerate() {
        limit.insert(
            i as i64 + 1,
            ReferenceLimitSet {
                caution_high: Some(*ch),
                caution_low: Some(*cl),
                warning_high: Some(*wh),
                warning_low: Some(*wl),
            },
        );
    }
    let mut snapshot = ReferenceSnapshot::default();
    snapshot.insert(
        msid,
        ReferenceEntry {
            limit: Some(limit),
            limit_default_set_num: Some(1),
            ..ReferenceEntry::default()
        },
    );
    let mut set = ReferenceSet::default();
    set.insert("ref", snapshot);
    set
}

/// A reference set whose only snapshot `ref` is empty
#[allow(dead_code)]
pub fn empty_reference() -> ReferenceSet {
    let mut set = ReferenceSet::default();
    set.insert("ref", ReferenceSnapshot::default());
    set
}

/// Parse, default, stamp and project one revision
#[allow(dead_code)]
pub fn prepare(text: &str, reference: &ReferenceSet) -> (ParsedRevision, RowStamp, Projection) {
    let mut parsed = parse_revision(text).unwrap();
    let ranges = single_range();
    ReferenceDefaulter::new(&ranges, reference)
        .apply(&mut parsed)
        .unwrap();
    let stamp = parsed.stamp().unwrap();
    let projection = project(&parsed, &stamp, true);
    (parsed, stamp, projection)
}
