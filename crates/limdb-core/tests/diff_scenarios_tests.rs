#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{empty_reference, prepare, revision_text};
use limdb_core::projection::{CommonColumns, LimitColumns, Row, RowStamp, Sentinel};
use limdb_core::{merge_table, LimitRow, RowKey};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn current_view(rows: &[LimitRow]) -> BTreeMap<RowKey, LimitRow> {
    rows.iter().map(|r| (r.key.clone(), r.clone())).collect()
}

#[test]
fn test_scenario_foo_removed_entity_is_deactivated() {
    // GIVEN revision 1 defines FOO with one enabled limit set
    let reference = empty_reference();
    let rev1 = revision_text(
        "2.1",
        "2015/01/01 00:00:00",
        "MLOAD FOO\nMLIMIT SET 0 PPENG 0 1 9 10\n",
    );
    let (_, _, first) = prepare(&rev1, &empty_reference());
    let store = current_view(&first.limits);

    // WHEN revision 2 omits FOO
    let rev2 = revision_text("2.2", "2015/02/01 00:00:00", "");
    let (_, stamp2, second) = prepare(&rev2, &reference);
    let delta = merge_table(&second.limits, &store, &stamp2);

    // THEN exactly one deactivated row is emitted with the revision-2 stamp
    assert!(delta.added.is_empty());
    assert!(delta.modified.is_empty());
    assert_eq!(delta.deactivated.len(), 1);
    let row = &delta.deactivated[0];
    assert_eq!(row.key, RowKey::new("foo", 0));
    assert_eq!(row.values.common.mlmenable, 0);
    assert_eq!(row.stamp, stamp2);
    assert_eq!(row.stamp.modversion, 2);
    assert_eq!(row.values.caution_high, Sentinel::Value(9.0));

    // AND a third revision still omitting FOO emits nothing more
    let mut store = store;
    store.insert(row.key.clone(), row.clone());
    let rev3 = revision_text("2.3", "2015/03/01 00:00:00", "");
    let (_, stamp3, third) = prepare(&rev3, &reference);
    assert!(merge_table(&third.limits, &store, &stamp3).is_empty());
}

#[test]
fn test_scenario_bar_threshold_change_is_modified() {
    // GIVEN revision 1 defines BAR with caution_high 10
    let reference = empty_reference();
    let rev1 = revision_text(
        "2.1",
        "2015/01/01 00:00:00",
        "MLOAD BAR\nMLIMIT SET 0 PPENG 0 1 10 20\n",
    );
    let (_, _, first) = prepare(&rev1, &reference);
    let store = current_view(&first.limits);

    // WHEN revision 2 raises caution_high to 12
    let rev2 = revision_text(
        "2.2",
        "2015/02/01 00:00:00",
        "MLOAD BAR\nMLIMIT SET 0 PPENG 0 1 12 20\n",
    );
    let (_, stamp2, second) = prepare(&rev2, &reference);
    let delta = merge_table(&second.limits, &store, &stamp2);

    // THEN exactly one modified row with the revision-2 stamp
    assert!(delta.added.is_empty());
    assert!(delta.deactivated.is_empty());
    assert_eq!(delta.modified.len(), 1);
    assert_eq!(delta.modified[0].values.caution_high, Sentinel::Value(12.0));
    assert_eq!(delta.modified[0].stamp.modversion, 2);

    // AND the stored revision-1 row is untouched
    assert_eq!(
        store[&RowKey::new("bar", 0)].values.caution_high,
        Sentinel::Value(10.0)
    );
}

#[test]
fn test_date_only_change_is_not_modified() {
    // GIVEN the same declarations in two revisions
    let reference = empty_reference();
    let body = "MLOAD BAR\nMLIMIT SET 0 PPENG 0 1 10 20\n";
    let (_, _, first) = prepare(&revision_text("2.1", "2015/01/01 00:00:00", body), &reference);
    let (_, stamp2, second) =
        prepare(&revision_text("2.2", "2015/02/01 00:00:00", body), &reference);

    // WHEN merging
    let delta = merge_table(&second.limits, &current_view(&first.limits), &stamp2);

    // THEN nothing is emitted
    assert!(delta.is_empty());
}

#[test]
fn test_batches_are_sorted_by_key() {
    let reference = empty_reference();
    let text = revision_text(
        "2.1",
        "2015/01/01 00:00:00",
        "MLOAD ZED\nMLIMIT SET 1 PPENG 0 1 2 3\nMLIMIT SET 0 PPENG 0 1 2 3\n\
         MLOAD ALPHA\nMLIMIT SET 0 PPENG 0 1 2 3\n",
    );
    let (_, stamp, projection) = prepare(&text, &reference);
    let delta = merge_table(&projection.limits, &BTreeMap::new(), &stamp);

    let keys: Vec<_> = delta.added.iter().map(|r| r.key.to_string()).collect();
    assert_eq!(keys, vec!["alpha/0", "zed/0", "zed/1"]);
}

fn row(msid: &str, setkey: i64, caution_high: i64, mlmenable: i64, modversion: i64) -> LimitRow {
    Row {
        key: RowKey::new(msid, setkey),
        stamp: RowStamp {
            datesec: modversion as f64,
            date: "2015-01-01 00:00:00".to_string(),
            modversion,
        },
        values: LimitColumns {
            common: CommonColumns {
                mlmenable,
                mlmtol: 1,
                default_set: 0,
                mlimsw: Sentinel::Unspecified,
            },
            caution_high: Sentinel::Value(caution_high as f64),
            caution_low: Sentinel::Unspecified,
            warning_high: Sentinel::Unspecified,
            warning_low: Sentinel::Unspecified,
            switchstate: Sentinel::Unspecified,
        },
    }
}

fn arb_rows(modversion: i64) -> impl Strategy<Value = Vec<LimitRow>> {
    prop::collection::vec(
        (
            prop_oneof![Just("a"), Just("b"), Just("c"), Just("d")],
            0i64..3,
            0i64..3,
            0i64..2,
        ),
        0..12,
    )
    .prop_map(move |items| {
        items
            .into_iter()
            .map(|(msid, setkey, ch, en)| row(msid, setkey, ch, en, modversion))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_passes_are_pairwise_disjoint(old in arb_rows(1), new in arb_rows(2)) {
        let store = current_view(&old);
        let new_rows: Vec<_> = new.into_iter().filter(|r| r.is_enabled()).collect();
        let stamp = new_rows
            .first()
            .map(|r| r.stamp.clone())
            .unwrap_or(row("a", 0, 0, 1, 2).stamp);

        let delta = merge_table(&new_rows, &store, &stamp);

        let added: BTreeSet<_> = delta.added.iter().map(|r| r.key.clone()).collect();
        let deactivated: BTreeSet<_> = delta.deactivated.iter().map(|r| r.key.clone()).collect();
        let modified: BTreeSet<_> = delta.modified.iter().map(|r| r.key.clone()).collect();

        prop_assert!(added.is_disjoint(&deactivated));
        prop_assert!(added.is_disjoint(&modified));
        prop_assert!(deactivated.is_disjoint(&modified));

        // Every emitted row carries the new stamp
        for emitted in delta.rows() {
            prop_assert_eq!(emitted.stamp.modversion, 2);
        }
        // Deactivated rows come only from enabled stored rows
        for key in &deactivated {
            prop_assert!(store[key].is_enabled());
        }
    }

    #[test]
    fn prop_merging_twice_is_a_no_op(old in arb_rows(1), new in arb_rows(2)) {
        let mut store = current_view(&old);
        let new_rows: Vec<_> = new.into_iter().filter(|r| r.is_enabled()).collect();
        let stamp = row("a", 0, 0, 1, 2).stamp;

        let delta = merge_table(&new_rows, &store, &stamp);
        for emitted in delta.rows() {
            store.insert(emitted.key.clone(), emitted.clone());
        }

        prop_assert!(merge_table(&new_rows, &store, &stamp).is_empty());
    }
}
