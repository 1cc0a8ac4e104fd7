//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical between the console log,
//! the JSON commit log and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_MSID: &str = "msid";
pub const FIELD_SETKEY: &str = "setkey";
pub const FIELD_MODVERSION: &str = "modversion";
pub const FIELD_REVISION: &str = "revision";
pub const FIELD_TABLE: &str = "table";

// Merge pass accounting
pub const FIELD_PASS: &str = "pass";
pub const FIELD_NEW_TOTAL: &str = "new_total";
pub const FIELD_OLD_TOTAL: &str = "old_total";
pub const FIELD_EMITTED: &str = "emitted";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_MERGE_PASS: &str = "merge_pass";
pub const EVENT_UNTYPED_ENTITY: &str = "untyped_entity";

// Merge pass names
pub const PASS_ADDED: &str = "added";
pub const PASS_DEACTIVATED: &str = "deactivated";
pub const PASS_MODIFIED: &str = "modified";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        assert!(!FIELD_COMPONENT.is_empty());
        assert!(!FIELD_OP.is_empty());
        assert!(!FIELD_MSID.is_empty());
        assert!(!EVENT_START.is_empty());
        assert!(!EVENT_MERGE_PASS.is_empty());
    }

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_pass_names_are_distinct() {
        assert_ne!(PASS_ADDED, PASS_DEACTIVATED);
        assert_ne!(PASS_ADDED, PASS_MODIFIED);
        assert_ne!(PASS_DEACTIVATED, PASS_MODIFIED);
    }
}
