//! Database connection management
//!
//! Provides utilities for opening and managing SQLite connections

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, not_found, Result};
use crate::migrations::apply_migrations;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Open a SQLite database at the given path, creating it if needed
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an existing store and bring its schema up to date
///
/// # Errors
///
/// `NotFound` when no store file exists at `path`.
pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(not_found("open_store", "store", path));
    }
    let mut conn = open(path)?;
    configure(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

/// Open an existing store for inspection only
///
/// No migrations or pragmas are applied; any write through the returned
/// connection fails.
///
/// # Errors
///
/// `NotFound` when no store file exists at `path`.
pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(not_found("open_store_read_only", "store", path));
    }
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection for a single-file store
pub fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(from_rusqlite)?;

    // Rollback journal keeps the store a single self-contained file
    conn.pragma_update(None, "journal_mode", "DELETE")
        .map_err(from_rusqlite)?;

    Ok(())
}
