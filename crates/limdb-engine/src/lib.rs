//! limdb engine - orchestration layer
//!
//! Coordinates the pure pipeline in `limdb-core` with persistence in
//! `limdb-store`: incremental merges, full rebuilds, archive discovery and
//! reproducibility checks.

pub mod archive;
pub mod commands;
pub mod pipeline;

pub use archive::{discover_archive, rebuild_plan, RevisionInput};
pub use commands::merge::{merge_one_revision, merge_revision_file, MergeOutcome};
pub use commands::query::{fingerprint_store, history, in_effect_at};
pub use commands::rebuild::{rebuild_from_scratch, RebuildOutcome};
pub use commands::verify::{verify_reproducible, VerifyReport};
pub use pipeline::{prepare_revision, MergeContext, PreparedRevision};
