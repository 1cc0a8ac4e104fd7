//! Fingerprint computer and ledger
//!
//! Each table is read in canonical order, every row rendered as one compact
//! JSON array, and the arrays fed line by line into SHA-256. The ledger row
//! for a version also carries the digest and size of the store file, which
//! can only be taken once the merge transaction has committed.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, io_error, serialization_error, Result};
use crate::repo::rows::column_list;
use crate::repo::versions::max_version;
use limdb_core::errors::{ExError, ExErrorKind};
use limdb_core::model::TableKind;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const FILE_CHUNK_BYTES: usize = 8192;

/// Hash and row count of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDigest {
    pub hash: String,
    pub count: i64,
}

/// The revision that triggered a ledger entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub file: Option<String>,
    pub revision: Option<String>,
    pub date: Option<String>,
}

/// One `build_fingerprints` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FingerprintRecord {
    pub version: i64,
    pub limit_hash: String,
    pub state_hash: String,
    pub version_hash: String,
    pub limit_count: i64,
    pub state_count: i64,
    pub version_count: i64,
    pub db_hash: Option<String>,
    pub db_size_bytes: Option<i64>,
    pub source_file: Option<String>,
    pub source_revision: Option<String>,
    pub source_date: Option<String>,
    pub created_at: String,
}

impl FingerprintRecord {
    /// True when both records describe identical table contents
    pub fn same_tables(&self, other: &Self) -> bool {
        self.limit_hash == other.limit_hash
            && self.state_hash == other.state_hash
            && self.version_hash == other.version_hash
            && self.limit_count == other.limit_count
            && self.state_count == other.state_count
            && self.version_count == other.version_count
    }
}

/// Digest of one row table in `(datesec, msid, setkey)` order
pub fn row_table_digest(conn: &Connection, kind: TableKind) -> Result<TableDigest> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY datesec, msid, setkey",
        column_list(kind),
        kind.table_name()
    );
    table_digest(conn, &sql)
}

/// Digest of `versions` in `(datesec, version)` order
pub fn version_table_digest(conn: &Connection) -> Result<TableDigest> {
    table_digest(
        conn,
        "SELECT version, datesec, date FROM versions ORDER BY datesec, version",
    )
}

fn table_digest(conn: &Connection, sql: &str) -> Result<TableDigest> {
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let width = stmt.column_count();
    let mut rows = stmt.query([]).map_err(from_rusqlite)?;

    let mut hasher = Sha256::new();
    let mut count = 0i64;
    while let Some(row) = rows.next().map_err(from_rusqlite)? {
        let mut cells = Vec::with_capacity(width);
        for index in 0..width {
            let value: Value = row.get(index).map_err(from_rusqlite)?;
            cells.push(json_cell(value));
        }
        let line = serde_json::to_string(&cells)
            .map_err(|e| serialization_error("fingerprint_row", e))?;
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
        count += 1;
    }

    Ok(TableDigest {
        hash: hex::encode(hasher.finalize()),
        count,
    })
}

fn json_cell(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(i),
        Value::Real(f) => serde_json::Value::from(f),
        Value::Text(t) => serde_json::Value::from(t),
        Value::Blob(b) => serde_json::Value::from(hex::encode(b)),
    }
}

/// SHA-256 and byte size of a file, read in fixed-size chunks
pub fn file_digest(path: &Path) -> Result<(String, i64)> {
    let mut file = File::open(path).map_err(|e| io_error("open_store_file", e))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; FILE_CHUNK_BYTES];
    let mut size = 0i64;
    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|e| io_error("read_store_file", e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        size += read as i64;
    }
    Ok((hex::encode(hasher.finalize()), size))
}

/// Hash every table and upsert the ledger row for the current max version
///
/// The file digest columns are left empty; see [`record_file_digest`].
///
/// # Errors
///
/// `NotFound` when the store has no versions yet.
pub fn compute_fingerprints(conn: &Connection, source: &SourceInfo) -> Result<FingerprintRecord> {
    let version = max_version(conn)?.ok_or_else(|| {
        ExError::new(ExErrorKind::NotFound)
            .with_op("compute_fingerprints")
            .with_message("store has no processed versions")
    })?;

    let limits = row_table_digest(conn, TableKind::Limit)?;
    let states = row_table_digest(conn, TableKind::ExpectedState)?;
    let versions = version_table_digest(conn)?;

    let record = FingerprintRecord {
        version,
        limit_hash: limits.hash,
        state_hash: states.hash,
        version_hash: versions.hash,
        limit_count: limits.count,
        state_count: states.count,
        version_count: versions.count,
        db_hash: None,
        db_size_bytes: None,
        source_file: source.file.clone(),
        source_revision: source.revision.clone(),
        source_date: source.date.clone(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    upsert_fingerprint(conn, &record)?;

    tracing::info!(
        version,
        limit_count = record.limit_count,
        state_count = record.state_count,
        version_count = record.version_count,
        "Fingerprint recorded"
    );
    Ok(record)
}

fn upsert_fingerprint(conn: &Connection, record: &FingerprintRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO build_fingerprints (
            version, limit_hash, state_hash, version_hash,
            limit_count, state_count, version_count,
            db_hash, db_size_bytes, source_file, source_revision, source_date, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(version) DO UPDATE SET
            limit_hash = excluded.limit_hash,
            state_hash = excluded.state_hash,
            version_hash = excluded.version_hash,
            limit_count = excluded.limit_count,
            state_count = excluded.state_count,
            version_count = excluded.version_count,
            db_hash = excluded.db_hash,
            db_size_bytes = excluded.db_size_bytes,
            source_file = excluded.source_file,
            source_revision = excluded.source_revision,
            source_date = excluded.source_date,
            created_at = excluded.created_at",
        rusqlite::params![
            record.version,
            record.limit_hash,
            record.state_hash,
            record.version_hash,
            record.limit_count,
            record.state_count,
            record.version_count,
            record.db_hash,
            record.db_size_bytes,
            record.source_file,
            record.source_revision,
            record.source_date,
            record.created_at,
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Fill the file digest columns of an existing ledger row
pub fn record_file_digest(conn: &Connection, version: i64, hash: &str, size: i64) -> Result<()> {
    conn.execute(
        "UPDATE build_fingerprints SET db_hash = ?1, db_size_bytes = ?2 WHERE version = ?3",
        rusqlite::params![hash, size, version],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

/// Ledger row of the highest version, if any
pub fn latest_fingerprint(conn: &Connection) -> Result<Option<FingerprintRecord>> {
    conn.query_row(
        "SELECT version, limit_hash, state_hash, version_hash,
                limit_count, state_count, version_count,
                db_hash, db_size_bytes, source_file, source_revision, source_date, created_at
         FROM build_fingerprints ORDER BY version DESC LIMIT 1",
        [],
        |row| {
            Ok(FingerprintRecord {
                version: row.get(0)?,
                limit_hash: row.get(1)?,
                state_hash: row.get(2)?,
                version_hash: row.get(3)?,
                limit_count: row.get(4)?,
                state_count: row.get(5)?,
                version_count: row.get(6)?,
                db_hash: row.get(7)?,
                db_size_bytes: row.get(8)?,
                source_file: row.get(9)?,
                source_revision: row.get(10)?,
                source_date: row.get(11)?,
                created_at: row.get(12)?,
            })
        },
    )
    .optional()
    .map_err(from_rusqlite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use std::io::Write;

    #[test]
    fn test_empty_tables_hash_to_empty_digest() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        let digest = row_table_digest(&conn, TableKind::Limit).unwrap();
        assert_eq!(digest.count, 0);
        assert_eq!(digest.hash, hex::encode(Sha256::digest(b"")));
    }

    #[test]
    fn test_compute_without_versions_is_not_found() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        let err = compute_fingerprints(&conn, &SourceInfo::default()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }

    #[test]
    fn test_file_digest_spans_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = vec![7u8; FILE_CHUNK_BYTES * 2 + 5];
        file.write_all(&content).unwrap();

        let (hash, size) = file_digest(file.path()).unwrap();
        assert_eq!(size, content.len() as i64);
        assert_eq!(hash, hex::encode(Sha256::digest(&content)));
    }
}
