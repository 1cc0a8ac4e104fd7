//! Domain model for one parsed limit-monitor revision

pub mod entity;
pub mod revision;
pub mod table;

pub use entity::{Entity, EntityType, LimitSet, Set, SetValues, StateSet};
pub use revision::{ParsedRevision, RevisionDate};
pub use table::TableKind;
