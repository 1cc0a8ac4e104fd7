//! Repository layer for the history tables
//!
//! Rows are only ever inserted; every read folds the append-only history
//! into the view a caller needs.

pub mod rows;
pub mod versions;

pub use rows::{
    current_view, history, history_any, in_effect_at, in_effect_any, insert_rows, StoredColumns,
};
pub use versions::{insert_version, list_versions, max_version, VersionRow};
