//! Core types shared across limdb facilities
//!
//! Holds the canonical field keys and event names used by the logging
//! facility and by every crate that emits structured merge events.

pub mod schema;
