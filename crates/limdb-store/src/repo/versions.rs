//! The `versions` table

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use limdb_core::projection::RowStamp;
use rusqlite::Connection;
use serde::Serialize;

/// One processed revision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionRow {
    pub version: i64,
    pub datesec: f64,
    pub date: String,
}

/// Record a processed revision
pub fn insert_version(conn: &Connection, stamp: &RowStamp) -> Result<()> {
    conn.execute(
        "INSERT INTO versions (version, datesec, date) VALUES (?1, ?2, ?3)",
        rusqlite::params![stamp.modversion, stamp.datesec, stamp.date],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Highest processed version, `None` for an empty store
pub fn max_version(conn: &Connection) -> Result<Option<i64>> {
    conn.query_row("SELECT MAX(version) FROM versions", [], |row| row.get(0))
        .map_err(from_rusqlite)
}

/// All processed revisions in version order
pub fn list_versions(conn: &Connection) -> Result<Vec<VersionRow>> {
    let mut stmt = conn
        .prepare("SELECT version, datesec, date FROM versions ORDER BY version")
        .map_err(from_rusqlite)?;
    let versions = stmt
        .query_map([], |row| {
            Ok(VersionRow {
                version: row.get(0)?,
                datesec: row.get(1)?,
                date: row.get(2)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(versions)
}
