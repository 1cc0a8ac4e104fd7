//! Reference snapshots and the defaulter that fills entities from them
//!
//! A reference snapshot holds default limit and expected-state sets per
//! msid, numbered from 1. The snapshot for a revision is picked by
//! [`SnapshotRanges`]; [`ReferenceDefaulter`] copies its data under every
//! entity it knows and then lays the revision's own declarations on top.

#![allow(clippy::result_large_err)]

use crate::errors::{LimitsError, Result};
use crate::model::{Entity, EntityType, LimitSet, ParsedRevision, Set, SetValues, StateSet};
use crate::projection::SENTINEL;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One revision range mapped to a snapshot id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRange {
    /// Inclusive upper revision bound, `None` for the open-ended last range
    #[serde(default)]
    pub up_to: Option<i64>,
    pub snapshot: String,
}

impl SnapshotRange {
    pub fn new(up_to: Option<i64>, snapshot: impl Into<String>) -> Self {
        Self {
            up_to,
            snapshot: snapshot.into(),
        }
    }
}

/// Contiguous revision ranges, each selecting one reference snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SnapshotRange>", into = "Vec<SnapshotRange>")]
pub struct SnapshotRanges {
    ranges: Vec<SnapshotRange>,
}

impl SnapshotRanges {
    /// Validate and build a range table
    ///
    /// # Errors
    ///
    /// `InvalidSnapshotRanges` unless upper bounds strictly increase and
    /// exactly the last range is open-ended.
    pub fn new(ranges: Vec<SnapshotRange>) -> Result<Self> {
        let invalid = |reason: &str| LimitsError::InvalidSnapshotRanges {
            reason: reason.to_string(),
        };
        let Some((last, bounded)) = ranges.split_last() else {
            return Err(invalid("at least one range is required"));
        };
        if last.up_to.is_some() {
            return Err(invalid("the last range must be open-ended"));
        }
        let mut previous: Option<i64> = None;
        for range in bounded {
            let up_to = range
                .up_to
                .ok_or_else(|| invalid("only the last range may be open-ended"))?;
            if previous.is_some_and(|p| up_to <= p) {
                return Err(invalid("upper bounds must strictly increase"));
            }
            previous = Some(up_to);
        }
        Ok(Self { ranges })
    }

    /// Snapshot id whose range contains `revision`
    pub fn resolve(&self, revision: i64) -> &str {
        self.ranges
            .iter()
            .find(|r| r.up_to.map_or(true, |up_to| revision <= up_to))
            .map(|r| r.snapshot.as_str())
            .unwrap_or_default()
    }

    pub fn ranges(&self) -> &[SnapshotRange] {
        &self.ranges
    }
}

impl Default for SnapshotRanges {
    fn default() -> Self {
        let bounded = [
            (130, "p007"),
            (228, "p009"),
            (245, "p010"),
            (249, "p011"),
            (256, "p012"),
            (260, "p013"),
            (342, "p014"),
            (359, "p015"),
            (407, "p016"),
        ];
        let mut ranges: Vec<SnapshotRange> = bounded
            .iter()
            .map(|(up_to, id)| SnapshotRange::new(Some(*up_to), *id))
            .collect();
        ranges.push(SnapshotRange::new(None, "p017"));
        Self { ranges }
    }
}

impl TryFrom<Vec<SnapshotRange>> for SnapshotRanges {
    type Error = LimitsError;

    fn try_from(ranges: Vec<SnapshotRange>) -> Result<Self> {
        Self::new(ranges)
    }
}

impl From<SnapshotRanges> for Vec<SnapshotRange> {
    fn from(ranges: SnapshotRanges) -> Self {
        ranges.ranges
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceLimitSet {
    pub caution_high: Option<f64>,
    pub caution_low: Option<f64>,
    pub warning_high: Option<f64>,
    pub warning_low: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceStateSet {
    #[serde(alias = "expected_state")]
    pub expst: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSwitchState {
    pub state_code: Option<String>,
}

/// Raw reference data for one msid; set maps are keyed 1-based
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceEntry {
    pub limit: Option<BTreeMap<i64, ReferenceLimitSet>>,
    pub limit_default_set_num: Option<i64>,
    pub limit_switch_msid: Option<String>,
    pub lim_switch: Option<BTreeMap<i64, ReferenceSwitchState>>,
    pub exp_state: Option<BTreeMap<i64, ReferenceStateSet>>,
    pub es_default_set_num: Option<i64>,
    pub es_switch_msid: Option<String>,
    pub es_switch: Option<BTreeMap<i64, ReferenceSwitchState>>,
}

/// Reference entries of one snapshot, keyed by lower-case msid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ReferenceEntry>",
    into = "BTreeMap<String, ReferenceEntry>"
)]
pub struct ReferenceSnapshot {
    entries: BTreeMap<String, ReferenceEntry>,
}

impl From<BTreeMap<String, ReferenceEntry>> for ReferenceSnapshot {
    fn from(entries: BTreeMap<String, ReferenceEntry>) -> Self {
        let mut snapshot = Self::default();
        for (msid, entry) in entries {
            snapshot.insert(&msid, entry);
        }
        snapshot
    }
}

impl From<ReferenceSnapshot> for BTreeMap<String, ReferenceEntry> {
    fn from(snapshot: ReferenceSnapshot) -> Self {
        snapshot.entries
    }
}

impl ReferenceSnapshot {
    pub fn insert(&mut self, msid: &str, entry: ReferenceEntry) {
        self.entries.insert(msid.to_lowercase(), entry);
    }

    pub fn entry(&self, msid: &str) -> Option<&ReferenceEntry> {
        self.entries.get(&msid.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only lookup of reference snapshots by id
pub trait ReferenceSource {
    fn snapshot(&self, id: &str) -> Option<&ReferenceSnapshot>;
}

/// All reference snapshots held in memory, keyed by snapshot id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceSet {
    snapshots: BTreeMap<String, ReferenceSnapshot>,
}

impl ReferenceSet {
    pub fn insert(&mut self, id: impl Into<String>, snapshot: ReferenceSnapshot) {
        self.snapshots.insert(id.into(), snapshot);
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }
}

impl ReferenceSource for ReferenceSet {
    fn snapshot(&self, id: &str) -> Option<&ReferenceSnapshot> {
        self.snapshots.get(id)
    }
}

/// Fills parsed entities from the snapshot selected for their revision
pub struct ReferenceDefaulter<'a> {
    ranges: &'a SnapshotRanges,
    source: &'a dyn ReferenceSource,
}

impl<'a> ReferenceDefaulter<'a> {
    pub fn new(ranges: &'a SnapshotRanges, source: &'a dyn ReferenceSource) -> Self {
        Self { ranges, source }
    }

    /// Resolve the snapshot for `parsed` and fill every entity it covers
    ///
    /// # Errors
    ///
    /// Fails when the revision number is missing or malformed, or when the
    /// resolved snapshot is not loaded.
    pub fn apply(&self, parsed: &mut ParsedRevision) -> Result<()> {
        let revision = parsed.revision_number()?;
        let snapshot_id = self.ranges.resolve(revision);
        let snapshot =
            self.source
                .snapshot(snapshot_id)
                .ok_or_else(|| LimitsError::SnapshotNotLoaded {
                    snapshot_id: snapshot_id.to_string(),
                })?;
        tracing::debug!(revision, snapshot_id, "Resolved reference snapshot");
        apply_snapshot(parsed, snapshot);
        Ok(())
    }
}

/// Fill every entity of `parsed` that `snapshot` has data for
pub fn apply_snapshot(parsed: &mut ParsedRevision, snapshot: &ReferenceSnapshot) {
    let default_tolerance = parsed.mlmdeftol;
    for entity in parsed.entities.values_mut() {
        if let Some(base) = snapshot.entry(&entity.name).and_then(reference_entity) {
            let declared = std::mem::take(entity);
            *entity = overlay(base, declared, default_tolerance);
        }
    }
}

/// Declared fields win over reference-derived ones
fn overlay(mut merged: Entity, declared: Entity, default_tolerance: Option<i64>) -> Entity {
    merged.name = declared.name;
    merged.mlmtol = declared.mlmtol.or(default_tolerance);
    merged.mlmenable = declared.mlmenable.or(Some(1));
    if declared.entity_type != EntityType::Undefined {
        merged.entity_type = declared.entity_type;
    }
    if !declared.set_keys.is_empty() {
        merged.set_keys = declared.set_keys;
        merged.sets = declared.sets;
    }
    if declared.default_set.is_some() {
        merged.default_set = declared.default_set;
    }
    if declared.mlimsw.is_some() {
        merged.mlimsw = declared.mlimsw;
    }
    merged
}

/// Entity built from reference data alone; limit data is preferred
fn reference_entity(entry: &ReferenceEntry) -> Option<Entity> {
    if let Some(limits) = &entry.limit {
        return Some(renumbered(
            EntityType::Limit,
            limits,
            |set| {
                SetValues::Limit(LimitSet {
                    warning_low: set.warning_low,
                    caution_low: set.caution_low,
                    caution_high: set.caution_high,
                    warning_high: set.warning_high,
                })
            },
            entry.limit_default_set_num,
            entry.limit_switch_msid.as_deref(),
            entry.lim_switch.as_ref(),
        ));
    }
    entry.exp_state.as_ref().map(|states| {
        renumbered(
            EntityType::ExpectedState,
            states,
            |set| {
                SetValues::State(StateSet {
                    expst: set.expst.clone(),
                })
            },
            entry.es_default_set_num,
            entry.es_switch_msid.as_deref(),
            entry.es_switch.as_ref(),
        )
    })
}

fn renumbered<T>(
    entity_type: EntityType,
    sets: &BTreeMap<i64, T>,
    values: impl Fn(&T) -> SetValues,
    default_set_num: Option<i64>,
    switch_msid: Option<&str>,
    switch_states: Option<&BTreeMap<i64, ReferenceSwitchState>>,
) -> Entity {
    let mut entity = Entity {
        entity_type,
        default_set: Some(default_set_num.map_or(0, |n| n - 1)),
        ..Entity::default()
    };
    for (number, set) in sets {
        entity.put_set(
            number - 1,
            Set {
                values: values(set),
                switchstate: None,
            },
        );
    }
    if let Some(switch_msid) = switch_msid {
        entity.mlimsw = Some(switch_msid.to_string());
        if let Some(states) = switch_states {
            for (key, set) in entity.sets.iter_mut() {
                let state = states
                    .get(&(key + 1))
                    .and_then(|s| s.state_code.clone())
                    .unwrap_or_else(|| SENTINEL.to_string());
                set.switchstate = Some(state);
            }
        }
    }
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ranges_resolve_boundaries() {
        let ranges = SnapshotRanges::default();
        assert_eq!(ranges.resolve(0), "p007");
        assert_eq!(ranges.resolve(130), "p007");
        assert_eq!(ranges.resolve(131), "p009");
        assert_eq!(ranges.resolve(256), "p012");
        assert_eq!(ranges.resolve(407), "p016");
        assert_eq!(ranges.resolve(408), "p017");
        assert_eq!(ranges.resolve(5000), "p017");
    }

    #[test]
    fn test_ranges_must_increase_and_end_open() {
        let err = SnapshotRanges::new(vec![
            SnapshotRange::new(Some(10), "a"),
            SnapshotRange::new(Some(10), "b"),
            SnapshotRange::new(None, "c"),
        ])
        .unwrap_err();
        assert!(matches!(err, LimitsError::InvalidSnapshotRanges { .. }));

        assert!(SnapshotRanges::new(vec![SnapshotRange::new(Some(10), "a")]).is_err());
        assert!(SnapshotRanges::new(vec![]).is_err());
    }

    #[test]
    fn test_reference_sets_are_renumbered_from_zero() {
        let mut limit = BTreeMap::new();
        limit.insert(1, ReferenceLimitSet::default());
        limit.insert(2, ReferenceLimitSet::default());
        let entry = ReferenceEntry {
            limit: Some(limit),
            limit_default_set_num: Some(2),
            ..ReferenceEntry::default()
        };
        let entity = reference_entity(&entry).unwrap();
        assert_eq!(entity.set_keys, vec![0, 1]);
        assert_eq!(entity.default_set, Some(1));
    }

    #[test]
    fn test_switch_states_fill_missing_with_sentinel() {
        let mut states = BTreeMap::new();
        states.insert(
            1,
            ReferenceStateSet {
                expst: Some("ON".to_string()),
            },
        );
        states.insert(
            2,
            ReferenceStateSet {
                expst: Some("OFF".to_string()),
            },
        );
        let mut switch = BTreeMap::new();
        switch.insert(
            1,
            ReferenceSwitchState {
                state_code: Some("NRM".to_string()),
            },
        );
        let entry = ReferenceEntry {
            exp_state: Some(states),
            es_switch_msid: Some("COSCS".to_string()),
            es_switch: Some(switch),
            ..ReferenceEntry::default()
        };
        let entity = reference_entity(&entry).unwrap();
        assert_eq!(entity.entity_type, EntityType::ExpectedState);
        assert_eq!(entity.mlimsw.as_deref(), Some("COSCS"));
        assert_eq!(entity.sets[&0].switchstate.as_deref(), Some("NRM"));
        assert_eq!(entity.sets[&1].switchstate.as_deref(), Some("none"));
    }

    #[test]
    fn test_limit_data_preferred_over_state_data() {
        let entry = ReferenceEntry {
            limit: Some(BTreeMap::new()),
            exp_state: Some(BTreeMap::new()),
            ..ReferenceEntry::default()
        };
        assert_eq!(
            reference_entity(&entry).unwrap().entity_type,
            EntityType::Limit
        );
    }

    #[test]
    fn test_snapshot_keys_are_lowercased_on_load() {
        let snapshot: ReferenceSnapshot =
            serde_json::from_str(r#"{"AOPCADMD": {"es_default_set_num": 1}}"#).unwrap();
        assert!(snapshot.entry("aopcadmd").is_some());
        assert!(snapshot.entry("AOPCADMD").is_some());
    }

    #[test]
    fn test_state_label_accepts_expected_state_key() {
        let set: ReferenceStateSet =
            serde_json::from_str(r#"{"expected_state": "ENAB"}"#).unwrap();
        assert_eq!(set.expst.as_deref(), Some("ENAB"));
    }
}
