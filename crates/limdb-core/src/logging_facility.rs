//! Structured logging facility for limdb
//!
//! This module provides:
//! - Single initialization point via `init(profile)`, optionally mirrored
//!   into a JSON commit log with `init_with_log_file`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use limdb_core::logging_facility::{init, Profile};
//!
//! // Initialize once at application startup
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, init_with_log_file, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
