//! limdb store - persistence for the limits history
//!
//! Provides:
//! - SQLite connection helpers and embedded, checksummed migrations
//! - Append-only row persistence with history and point-in-time queries
//! - The fingerprint ledger (table digests plus whole-file digest)
//! - Atomic replacement of the production store file
//! - Loading of reference snapshots from JSON

pub mod atomic;
pub mod db;
pub mod errors;
pub mod fingerprint;
pub mod migrations;
pub mod reference;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use fingerprint::{FingerprintRecord, SourceInfo, TableDigest};
pub use repo::VersionRow;
