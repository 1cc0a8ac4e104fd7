//! limdb core - parsing and reconciliation of limit-monitor revisions
//!
//! This crate holds everything that does not touch the store:
//! - the revision format parser and its entity model
//! - reference snapshot defaulting
//! - row projection with the `"none"` sentinel
//! - the added/deactivated/modified diff engine
//! - the error, logging and configuration facilities shared by all crates

pub mod config;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod parser;
pub mod projection;
pub mod reference;

// Re-export commonly used types
pub use config::LimdbConfig;
pub use diff::{merge_table, DeltaCounts, TableDelta};
pub use errors::{ExError, ExErrorKind, LimitsError, Result};
pub use model::{Entity, EntityType, ParsedRevision, TableKind};
pub use parser::{parse_revision, parse_revision_file};
pub use projection::{project, AnyRow, LimitRow, Projection, Row, RowKey, Sentinel, StateRow};
pub use reference::{ReferenceDefaulter, ReferenceSet, ReferenceSource, SnapshotRanges};
