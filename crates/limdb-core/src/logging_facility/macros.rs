//! Operation boundary macros
//!
//! Every field name comes from `limdb_core_types::schema`, so callers need
//! that crate in scope. A merge names its input revision on `start` and the
//! `modversion` it wrote on `end`; other operations pass free-form fields.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use limdb_core::log_op_start;
/// log_op_start!("rebuild_from_scratch");
/// log_op_start!("merge_one_revision", revision = "2.256");
/// log_op_start!("verify_reproducible", revisions = 3);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            { limdb_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { limdb_core_types::schema::FIELD_OP } = $op,
            { limdb_core_types::schema::FIELD_EVENT } = limdb_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, revision = $revision:expr) => {
        tracing::info!(
            { limdb_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { limdb_core_types::schema::FIELD_OP } = $op,
            { limdb_core_types::schema::FIELD_EVENT } = limdb_core_types::schema::EVENT_START,
            { limdb_core_types::schema::FIELD_REVISION } = %$revision,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            { limdb_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { limdb_core_types::schema::FIELD_OP } = $op,
            { limdb_core_types::schema::FIELD_EVENT } = limdb_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// `modversion` records the ledger version a merge stamped on its rows.
///
/// # Example
///
/// ```
/// # use limdb_core::log_op_end;
/// log_op_end!("rebuild_from_scratch", duration_ms = 42);
/// log_op_end!("merge_one_revision", duration_ms = 42, modversion = 7);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            { limdb_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { limdb_core_types::schema::FIELD_OP } = $op,
            { limdb_core_types::schema::FIELD_EVENT } = limdb_core_types::schema::EVENT_END,
            { limdb_core_types::schema::FIELD_DURATION_MS } = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, modversion = $modversion:expr) => {
        tracing::info!(
            { limdb_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { limdb_core_types::schema::FIELD_OP } = $op,
            { limdb_core_types::schema::FIELD_EVENT } = limdb_core_types::schema::EVENT_END,
            { limdb_core_types::schema::FIELD_DURATION_MS } = $duration,
            { limdb_core_types::schema::FIELD_MODVERSION } = $modversion,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            { limdb_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { limdb_core_types::schema::FIELD_OP } = $op,
            { limdb_core_types::schema::FIELD_EVENT } = limdb_core_types::schema::EVENT_END,
            { limdb_core_types::schema::FIELD_DURATION_MS } = $duration,
            $($field)*
        );
    };
}

/// Log a failed operation
///
/// Takes anything convertible into `ExError` (a `LimitsError` included)
/// and records its kind and stable code. A failed merge may name the
/// revision it was applying.
///
/// # Example
///
/// ```
/// # use limdb_core::log_op_error;
/// # use limdb_core::errors::{ExError, ExErrorKind};
/// let err = ExError::new(ExErrorKind::StaleRevision);
/// log_op_error!("merge_one_revision", err, duration_ms = 10, revision = "2.1");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            { limdb_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { limdb_core_types::schema::FIELD_OP } = $op,
            { limdb_core_types::schema::FIELD_EVENT } = limdb_core_types::schema::EVENT_END_ERROR,
            { limdb_core_types::schema::FIELD_DURATION_MS } = $duration,
            { limdb_core_types::schema::FIELD_ERR_KIND } = ?ex_err.kind(),
            { limdb_core_types::schema::FIELD_ERR_CODE } = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, revision = $revision:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            { limdb_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { limdb_core_types::schema::FIELD_OP } = $op,
            { limdb_core_types::schema::FIELD_EVENT } = limdb_core_types::schema::EVENT_END_ERROR,
            { limdb_core_types::schema::FIELD_DURATION_MS } = $duration,
            { limdb_core_types::schema::FIELD_ERR_KIND } = ?ex_err.kind(),
            { limdb_core_types::schema::FIELD_ERR_CODE } = ex_err.code(),
            { limdb_core_types::schema::FIELD_REVISION } = %$revision,
        );
    }};
}
