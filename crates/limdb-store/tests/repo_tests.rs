#![allow(clippy::unwrap_used, clippy::expect_used)]

use limdb_core::model::TableKind;
use limdb_core::projection::{
    AnyRow, CommonColumns, LimitColumns, LimitRow, Row, RowKey, RowStamp, Sentinel,
};
use limdb_store::migrations::apply_migrations;
use limdb_store::repo::{history, history_any, in_effect_any, in_effect_at, insert_rows};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();
    conn
}

fn limit_row(msid: &str, setkey: i64, caution_high: Option<f64>, modversion: i64) -> LimitRow {
    Row {
        key: RowKey::new(msid, setkey),
        stamp: RowStamp {
            datesec: modversion as f64 * 100.0,
            date: format!("2015-01-{:02} 00:00:00", modversion),
            modversion,
        },
        values: LimitColumns {
            common: CommonColumns {
                mlmenable: 1,
                mlmtol: 1,
                default_set: 0,
                mlimsw: Sentinel::Value("coscs098s".to_string()),
            },
            caution_high: caution_high.into(),
            caution_low: Sentinel::Value(1.0),
            warning_high: Sentinel::Value(20.0),
            warning_low: Sentinel::Value(0.0),
            switchstate: Sentinel::Value("on".to_string()),
        },
    }
}

#[test]
fn test_history_is_in_insertion_order() {
    // GIVEN three generations of one set
    let conn = setup();
    let rows = vec![
        limit_row("tephin", 0, Some(10.0), 1),
        limit_row("tephin", 0, Some(12.0), 2),
        limit_row("tephin", 0, None, 3),
    ];
    insert_rows(&conn, &rows).unwrap();

    // WHEN reading its history with an upper-case msid
    let stored = history::<LimitColumns>(&conn, "TEPHIN").unwrap();

    // THEN every row comes back unchanged, oldest first
    assert_eq!(stored, rows);
}

#[test]
fn test_in_effect_at_picks_latest_row_per_set_before_time() {
    // GIVEN set 0 changed at versions 1 and 3, set 1 added at version 2
    let conn = setup();
    insert_rows(
        &conn,
        &[
            limit_row("tephin", 0, Some(10.0), 1),
            limit_row("tephin", 1, Some(50.0), 2),
            limit_row("tephin", 0, Some(12.0), 3),
        ],
    )
    .unwrap();

    // WHEN asking for the rows in effect just after version 2
    let rows = in_effect_at::<LimitColumns>(&conn, "tephin", 250.0).unwrap();

    // THEN set 0 still has its version-1 value and set 1 is present
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].values.caution_high, Sentinel::Value(10.0));
    assert_eq!(rows[1].key.setkey, 1);

    // AND before anything was written there are no rows
    assert!(in_effect_at::<LimitColumns>(&conn, "tephin", 50.0)
        .unwrap()
        .is_empty());
}

#[test]
fn test_runtime_table_selection() {
    let conn = setup();
    insert_rows(&conn, &[limit_row("tephin", 0, Some(10.0), 1)]).unwrap();

    let limits = history_any(&conn, TableKind::Limit, "tephin").unwrap();
    assert!(matches!(limits.as_slice(), [AnyRow::Limit(_)]));

    let states = history_any(&conn, TableKind::ExpectedState, "tephin").unwrap();
    assert!(states.is_empty());

    let effective = in_effect_any(&conn, TableKind::Limit, "tephin", 1000.0).unwrap();
    assert_eq!(effective.len(), 1);
    assert_eq!(effective[0].stamp().modversion, 1);
}
