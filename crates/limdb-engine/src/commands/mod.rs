//! Command orchestration layer.
//!
//! Each public command logs its boundaries with `log_op_start!` /
//! `log_op_end!` / `log_op_error!` and delegates to an `_impl` function.

pub mod merge;
pub mod query;
pub mod rebuild;
pub mod verify;
