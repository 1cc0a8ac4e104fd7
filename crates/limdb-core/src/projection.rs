//! Row projector
//!
//! Flattens a defaulted [`ParsedRevision`] into the fixed-column rows of
//! the `limits` and `expected_states` tables. Absent optional values become
//! [`Sentinel::Unspecified`], which is written everywhere as `"none"`.

use crate::model::{EntityType, ParsedRevision, SetValues, TableKind};
use limdb_core_types::schema::{EVENT_UNTYPED_ENTITY, FIELD_MSID};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub use crate::model::revision::RowStamp;

/// Text standing in for an unspecified value in rows and hashes
pub const SENTINEL: &str = "none";

/// A column value that may be explicitly unspecified
#[derive(Debug, Clone, PartialEq)]
pub enum Sentinel<T> {
    Value(T),
    Unspecified,
}

impl<T> Sentinel<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Sentinel::Value(v) => Some(v),
            Sentinel::Unspecified => None,
        }
    }
}

impl Sentinel<String> {
    /// Lower-cased text; the literal sentinel reads back as unspecified
    pub fn text(value: Option<&str>) -> Self {
        match value.map(str::to_lowercase) {
            Some(v) if v != SENTINEL => Sentinel::Value(v),
            _ => Sentinel::Unspecified,
        }
    }
}

impl<T> From<Option<T>> for Sentinel<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Sentinel::Unspecified, Sentinel::Value)
    }
}

impl<T: Serialize> Serialize for Sentinel<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Sentinel::Value(v) => v.serialize(serializer),
            Sentinel::Unspecified => serializer.serialize_str(SENTINEL),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Sentinel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentinel::Value(v) => v.fmt(f),
            Sentinel::Unspecified => f.write_str(SENTINEL),
        }
    }
}

/// Identity of a row across revisions
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RowKey {
    pub msid: String,
    pub setkey: i64,
}

impl RowKey {
    pub fn new(msid: impl Into<String>, setkey: i64) -> Self {
        Self {
            msid: msid.into(),
            setkey,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.msid, self.setkey)
    }
}

/// Entity-level columns shared by both tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonColumns {
    pub mlmenable: i64,
    pub mlmtol: i64,
    pub default_set: i64,
    pub mlimsw: Sentinel<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitColumns {
    #[serde(flatten)]
    pub common: CommonColumns,
    pub caution_high: Sentinel<f64>,
    pub caution_low: Sentinel<f64>,
    pub warning_high: Sentinel<f64>,
    pub warning_low: Sentinel<f64>,
    pub switchstate: Sentinel<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateColumns {
    #[serde(flatten)]
    pub common: CommonColumns,
    pub expst: Sentinel<String>,
    pub switchstate: Sentinel<String>,
}

/// Mutable (non-stamp) columns of one table's rows
pub trait RowColumns: Clone + PartialEq + fmt::Debug {
    const KIND: TableKind;

    fn common(&self) -> &CommonColumns;
    fn common_mut(&mut self) -> &mut CommonColumns;
}

impl RowColumns for LimitColumns {
    const KIND: TableKind = TableKind::Limit;

    fn common(&self) -> &CommonColumns {
        &self.common
    }

    fn common_mut(&mut self) -> &mut CommonColumns {
        &mut self.common
    }
}

impl RowColumns for StateColumns {
    const KIND: TableKind = TableKind::ExpectedState;

    fn common(&self) -> &CommonColumns {
        &self.common
    }

    fn common_mut(&mut self) -> &mut CommonColumns {
        &mut self.common
    }
}

/// One stored row: key, append-only stamp, mutable columns
///
/// Serializes flat, in table column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row<V> {
    #[serde(flatten)]
    pub key: RowKey,
    #[serde(flatten)]
    pub stamp: RowStamp,
    #[serde(flatten)]
    pub values: V,
}

pub type LimitRow = Row<LimitColumns>;
pub type StateRow = Row<StateColumns>;

impl<V: RowColumns> Row<V> {
    pub fn is_enabled(&self) -> bool {
        self.values.common().mlmenable != 0
    }

    /// Equality over every column except `datesec`, `date` and `modversion`
    pub fn mutable_eq(&self, other: &Self) -> bool {
        self.key == other.key && self.values == other.values
    }

    /// Copy of this row re-stamped and disabled
    pub fn deactivated(&self, stamp: &RowStamp) -> Self {
        let mut row = self.clone();
        row.stamp = stamp.clone();
        row.values.common_mut().mlmenable = 0;
        row
    }
}

/// A row from either table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnyRow {
    Limit(LimitRow),
    State(StateRow),
}

impl AnyRow {
    pub fn key(&self) -> &RowKey {
        match self {
            AnyRow::Limit(row) => &row.key,
            AnyRow::State(row) => &row.key,
        }
    }

    pub fn stamp(&self) -> &RowStamp {
        match self {
            AnyRow::Limit(row) => &row.stamp,
            AnyRow::State(row) => &row.stamp,
        }
    }
}

/// Rows projected from one revision, each table sorted by key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub limits: Vec<LimitRow>,
    pub states: Vec<StateRow>,
    /// Enabled entities with neither limit nor state data (lower-case msids)
    pub untyped: Vec<String>,
}

/// Project a defaulted revision into rows stamped with `stamp`
///
/// Disabled entities are left out when `discard_disabled` is set; the
/// merge engine's deactivation pass accounts for them instead.
pub fn project(parsed: &ParsedRevision, stamp: &RowStamp, discard_disabled: bool) -> Projection {
    let mut limits = BTreeMap::new();
    let mut states = BTreeMap::new();
    let mut untyped = Vec::new();

    for entity in parsed.entities.values() {
        let msid = entity.name.to_lowercase();
        if discard_disabled && entity.is_disabled() {
            tracing::debug!(msid = %msid, "Skipping disabled entity");
            continue;
        }

        let common = CommonColumns {
            mlmenable: entity.mlmenable.unwrap_or(1),
            mlmtol: entity.mlmtol.or(parsed.mlmdeftol).unwrap_or(1),
            default_set: entity.default_set.unwrap_or(0),
            mlimsw: Sentinel::text(entity.mlimsw.as_deref()),
        };

        match entity.entity_type {
            EntityType::Undefined => {
                if !entity.is_disabled() {
                    tracing::warn!(
                        event = EVENT_UNTYPED_ENTITY,
                        { FIELD_MSID } = %msid,
                        revision = parsed.revision.as_deref().unwrap_or_default(),
                        "No limits or expected states defined in the reference or the revision, \
                         yet enabled; entity will be removed"
                    );
                    untyped.push(msid);
                }
            }
            EntityType::Limit => {
                for (setkey, set) in entity.ordered_sets() {
                    let thresholds = match &set.values {
                        SetValues::Limit(limit) => limit.clone(),
                        _ => Default::default(),
                    };
                    let key = RowKey::new(msid.clone(), setkey);
                    let values = LimitColumns {
                        common: common.clone(),
                        caution_high: thresholds.caution_high.into(),
                        caution_low: thresholds.caution_low.into(),
                        warning_high: thresholds.warning_high.into(),
                        warning_low: thresholds.warning_low.into(),
                        switchstate: Sentinel::text(set.switchstate.as_deref()),
                    };
                    limits.insert(key.clone(), row(key, stamp, values));
                }
            }
            EntityType::ExpectedState => {
                for (setkey, set) in entity.ordered_sets() {
                    let expst = match &set.values {
                        SetValues::State(state) => state.expst.as_deref(),
                        _ => None,
                    };
                    let key = RowKey::new(msid.clone(), setkey);
                    let values = StateColumns {
                        common: common.clone(),
                        expst: Sentinel::text(expst),
                        switchstate: Sentinel::text(set.switchstate.as_deref()),
                    };
                    states.insert(key.clone(), row(key, stamp, values));
                }
            }
        }
    }

    Projection {
        limits: limits.into_values().collect(),
        states: states.into_values().collect(),
        untyped,
    }
}

fn row<V>(key: RowKey, stamp: &RowStamp, values: V) -> Row<V> {
    Row {
        key,
        stamp: stamp.clone(),
        values,
    }
}
