//! Diff/merge engine
//!
//! Compares one table's freshly projected rows against the store's
//! current-per-key view and computes the three append batches. The passes
//! always run in the order added, deactivated, modified.

use crate::projection::{Row, RowColumns, RowKey, RowStamp};
use limdb_core_types::schema::{
    EVENT_MERGE_PASS, FIELD_EMITTED, FIELD_NEW_TOTAL, FIELD_OLD_TOTAL, FIELD_PASS, FIELD_TABLE,
    PASS_ADDED, PASS_DEACTIVATED, PASS_MODIFIED,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Rows to append for one table, each batch sorted by `(msid, setkey)`
#[derive(Debug, Clone, PartialEq)]
pub struct TableDelta<V> {
    pub added: Vec<Row<V>>,
    pub deactivated: Vec<Row<V>>,
    pub modified: Vec<Row<V>>,
}

impl<V> Default for TableDelta<V> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            deactivated: Vec::new(),
            modified: Vec::new(),
        }
    }
}

impl<V> TableDelta<V> {
    /// All batches in write order
    pub fn rows(&self) -> impl Iterator<Item = &Row<V>> {
        self.added
            .iter()
            .chain(self.deactivated.iter())
            .chain(self.modified.iter())
    }

    pub fn counts(&self) -> DeltaCounts {
        DeltaCounts {
            added: self.added.len(),
            deactivated: self.deactivated.len(),
            modified: self.modified.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deactivated.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeltaCounts {
    pub added: usize,
    pub deactivated: usize,
    pub modified: usize,
}

/// Compute the append batches for one table
///
/// `current` is the latest stored row per key. New rows are assumed to
/// already carry `stamp`; deactivated rows are re-stamped with it.
pub fn merge_table<V: RowColumns>(
    new_rows: &[Row<V>],
    current: &BTreeMap<RowKey, Row<V>>,
    stamp: &RowStamp,
) -> TableDelta<V> {
    let table = V::KIND.as_str();

    let mut latest_new: BTreeMap<&RowKey, &Row<V>> = BTreeMap::new();
    for row in new_rows {
        latest_new.insert(&row.key, row);
    }
    let new_keys: BTreeSet<&RowKey> = latest_new.keys().copied().collect();
    let old_keys: BTreeSet<&RowKey> = current.keys().collect();

    let added: Vec<Row<V>> = new_keys
        .difference(&old_keys)
        .map(|key| latest_new[key].clone())
        .collect();
    log_pass(table, PASS_ADDED, new_keys.len(), old_keys.len(), added.len());

    // Already-disabled keys count as present so they are not disabled again
    let mut present = new_keys.clone();
    present.extend(
        current
            .iter()
            .filter(|(_, row)| !row.is_enabled())
            .map(|(key, _)| key),
    );
    let deactivated: Vec<Row<V>> = old_keys
        .difference(&present)
        .map(|key| current[*key].deactivated(stamp))
        .collect();
    log_pass(
        table,
        PASS_DEACTIVATED,
        new_keys.len(),
        old_keys.len(),
        deactivated.len(),
    );

    let modified: Vec<Row<V>> = new_keys
        .intersection(&old_keys)
        .filter(|key| !latest_new[**key].mutable_eq(&current[**key]))
        .map(|key| latest_new[key].clone())
        .collect();
    log_pass(
        table,
        PASS_MODIFIED,
        new_keys.len(),
        old_keys.len(),
        modified.len(),
    );

    TableDelta {
        added,
        deactivated,
        modified,
    }
}

fn log_pass(table: &str, pass: &str, new_total: usize, old_total: usize, emitted: usize) {
    tracing::info!(
        event = EVENT_MERGE_PASS,
        { FIELD_TABLE } = table,
        { FIELD_PASS } = pass,
        { FIELD_NEW_TOTAL } = new_total,
        { FIELD_OLD_TOTAL } = old_total,
        { FIELD_EMITTED } = emitted,
        "Merge pass complete"
    );
}
