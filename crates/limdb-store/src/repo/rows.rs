//! Row persistence for `limits` and `expected_states`

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use limdb_core::model::TableKind;
use limdb_core::projection::{
    AnyRow, CommonColumns, LimitColumns, Row, RowColumns, RowKey, RowStamp, Sentinel,
    StateColumns, SENTINEL,
};
use limdb_core_types::schema::{FIELD_MODVERSION, FIELD_MSID, FIELD_SETKEY, FIELD_TABLE};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;

/// Leading columns shared by both tables, in schema order
pub const BASE_COLUMNS: [&str; 9] = [
    "msid",
    "setkey",
    "datesec",
    "date",
    "modversion",
    "mlmenable",
    "mlmtol",
    "default_set",
    "mlimsw",
];

/// Table-specific columns of a row type and their SQL encoding
pub trait StoredColumns: RowColumns {
    /// Columns following [`BASE_COLUMNS`], in schema order
    const VALUE_COLUMNS: &'static [&'static str];

    fn value_params(&self) -> Vec<Value>;

    fn from_columns(
        common: CommonColumns,
        row: &rusqlite::Row<'_>,
        offset: usize,
    ) -> rusqlite::Result<Self>;
}

impl StoredColumns for LimitColumns {
    const VALUE_COLUMNS: &'static [&'static str] = &[
        "caution_high",
        "caution_low",
        "warning_high",
        "warning_low",
        "switchstate",
    ];

    fn value_params(&self) -> Vec<Value> {
        vec![
            number_value(&self.caution_high),
            number_value(&self.caution_low),
            number_value(&self.warning_high),
            number_value(&self.warning_low),
            text_value(&self.switchstate),
        ]
    }

    fn from_columns(
        common: CommonColumns,
        row: &rusqlite::Row<'_>,
        offset: usize,
    ) -> rusqlite::Result<Self> {
        Ok(LimitColumns {
            common,
            caution_high: number_column(row, offset)?,
            caution_low: number_column(row, offset + 1)?,
            warning_high: number_column(row, offset + 2)?,
            warning_low: number_column(row, offset + 3)?,
            switchstate: text_column(row, offset + 4)?,
        })
    }
}

impl StoredColumns for StateColumns {
    const VALUE_COLUMNS: &'static [&'static str] = &["expst", "switchstate"];

    fn value_params(&self) -> Vec<Value> {
        vec![text_value(&self.expst), text_value(&self.switchstate)]
    }

    fn from_columns(
        common: CommonColumns,
        row: &rusqlite::Row<'_>,
        offset: usize,
    ) -> rusqlite::Result<Self> {
        Ok(StateColumns {
            common,
            expst: text_column(row, offset)?,
            switchstate: text_column(row, offset + 1)?,
        })
    }
}

/// Comma-separated column list of a table, in schema order
pub fn column_list(kind: TableKind) -> String {
    let values = match kind {
        TableKind::Limit => LimitColumns::VALUE_COLUMNS,
        TableKind::ExpectedState => StateColumns::VALUE_COLUMNS,
    };
    BASE_COLUMNS
        .iter()
        .chain(values.iter())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Append rows; returns the number written
///
/// Pass a `Transaction` (it derefs to `Connection`) to keep a merge atomic.
pub fn insert_rows<V: StoredColumns>(conn: &Connection, rows: &[Row<V>]) -> Result<usize> {
    let kind = V::KIND;
    let width = BASE_COLUMNS.len() + V::VALUE_COLUMNS.len();
    let placeholders = (1..=width)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        kind.table_name(),
        column_list(kind),
        placeholders
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(from_rusqlite)?;

    for row in rows {
        stmt.execute(params_from_iter(row_params(row)))
            .map_err(from_rusqlite)?;
        tracing::debug!(
            { FIELD_TABLE } = kind.as_str(),
            { FIELD_MSID } = %row.key.msid,
            { FIELD_SETKEY } = row.key.setkey,
            { FIELD_MODVERSION } = row.stamp.modversion,
            "Row written"
        );
    }
    Ok(rows.len())
}

/// Latest row per `(msid, setkey)`
pub fn current_view<V: StoredColumns>(conn: &Connection) -> Result<BTreeMap<RowKey, Row<V>>> {
    let rows = select_rows::<V>(conn, "", &[], "modversion, id")?;
    Ok(latest_per_key(rows))
}

/// Every row of one msid in insertion order
pub fn history<V: StoredColumns>(conn: &Connection, msid: &str) -> Result<Vec<Row<V>>> {
    select_rows(
        conn,
        "WHERE msid = ?1",
        &[Value::Text(msid.to_lowercase())],
        "id",
    )
}

/// Rows of one msid in effect at `datesec`: the latest row per set written
/// at or before that time, ordered by setkey
pub fn in_effect_at<V: StoredColumns>(
    conn: &Connection,
    msid: &str,
    datesec: f64,
) -> Result<Vec<Row<V>>> {
    let rows = select_rows::<V>(
        conn,
        "WHERE msid = ?1 AND datesec <= ?2",
        &[Value::Text(msid.to_lowercase()), Value::Real(datesec)],
        "modversion, id",
    )?;
    Ok(latest_per_key(rows).into_values().collect())
}

/// [`history`] for a table chosen at runtime
pub fn history_any(conn: &Connection, kind: TableKind, msid: &str) -> Result<Vec<AnyRow>> {
    Ok(match kind {
        TableKind::Limit => history::<LimitColumns>(conn, msid)?
            .into_iter()
            .map(AnyRow::Limit)
            .collect(),
        TableKind::ExpectedState => history::<StateColumns>(conn, msid)?
            .into_iter()
            .map(AnyRow::State)
            .collect(),
    })
}

/// [`in_effect_at`] for a table chosen at runtime
pub fn in_effect_any(
    conn: &Connection,
    kind: TableKind,
    msid: &str,
    datesec: f64,
) -> Result<Vec<AnyRow>> {
    Ok(match kind {
        TableKind::Limit => in_effect_at::<LimitColumns>(conn, msid, datesec)?
            .into_iter()
            .map(AnyRow::Limit)
            .collect(),
        TableKind::ExpectedState => in_effect_at::<StateColumns>(conn, msid, datesec)?
            .into_iter()
            .map(AnyRow::State)
            .collect(),
    })
}

fn latest_per_key<V>(rows: Vec<Row<V>>) -> BTreeMap<RowKey, Row<V>> {
    let mut latest = BTreeMap::new();
    for row in rows {
        latest.insert(row.key.clone(), row);
    }
    latest
}

fn select_rows<V: StoredColumns>(
    conn: &Connection,
    filter: &str,
    params: &[Value],
    order_by: &str,
) -> Result<Vec<Row<V>>> {
    let sql = format!(
        "SELECT {} FROM {} {} ORDER BY {}",
        column_list(V::KIND),
        V::KIND.table_name(),
        filter,
        order_by
    );
    let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), decode_row::<V>)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

fn decode_row<V: StoredColumns>(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row<V>> {
    let common = CommonColumns {
        mlmenable: row.get(5)?,
        mlmtol: row.get(6)?,
        default_set: row.get(7)?,
        mlimsw: text_column(row, 8)?,
    };
    Ok(Row {
        key: RowKey {
            msid: row.get(0)?,
            setkey: row.get(1)?,
        },
        stamp: RowStamp {
            datesec: row.get(2)?,
            date: row.get(3)?,
            modversion: row.get(4)?,
        },
        values: V::from_columns(common, row, BASE_COLUMNS.len())?,
    })
}

fn row_params<V: StoredColumns>(row: &Row<V>) -> Vec<Value> {
    let common = row.values.common();
    let mut params = vec![
        Value::Text(row.key.msid.clone()),
        Value::Integer(row.key.setkey),
        Value::Real(row.stamp.datesec),
        Value::Text(row.stamp.date.clone()),
        Value::Integer(row.stamp.modversion),
        Value::Integer(common.mlmenable),
        Value::Integer(common.mlmtol),
        Value::Integer(common.default_set),
        text_value(&common.mlimsw),
    ];
    params.extend(row.values.value_params());
    params
}

fn number_value(value: &Sentinel<f64>) -> Value {
    match value {
        Sentinel::Value(v) => Value::Real(*v),
        Sentinel::Unspecified => Value::Text(SENTINEL.to_string()),
    }
}

fn text_value(value: &Sentinel<String>) -> Value {
    Value::Text(value.to_string())
}

fn number_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<Sentinel<f64>> {
    Ok(match row.get::<_, Value>(index)? {
        Value::Real(v) => Sentinel::Value(v),
        Value::Integer(v) => Sentinel::Value(v as f64),
        Value::Text(text) if text != SENTINEL => text
            .parse()
            .map_or(Sentinel::Unspecified, Sentinel::Value),
        _ => Sentinel::Unspecified,
    })
}

fn text_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<Sentinel<String>> {
    let text: Option<String> = row.get(index)?;
    Ok(Sentinel::text(text.as_deref()))
}
