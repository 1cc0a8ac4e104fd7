use thiserror::Error;

/// Result type alias using LimitsError
pub type Result<T> = std::result::Result<T, LimitsError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure in limdb is classified into one of these kinds. Each kind
/// maps to a stable error code used by the CLI, the logs and the tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    /// A directive line is structurally broken (no open entity, missing operand, bad number)
    MalformedInput,
    /// An entity mixes limit and expected-state sets
    TypeConflict,
    /// A table-type argument other than `limit` / `expected_state`
    InvalidTableType,
    /// `$Revision` or `$Date` metadata is absent or unusable
    MissingMetadata,
    NotFound,

    // Merge
    /// The revision is not newer than the store's latest version
    StaleRevision,
    /// Two rebuilds from identical inputs disagree
    DeterminismViolation,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::MalformedInput => "ERR_MALFORMED_INPUT",
            ExErrorKind::TypeConflict => "ERR_TYPE_CONFLICT",
            ExErrorKind::InvalidTableType => "ERR_INVALID_TABLE_TYPE",
            ExErrorKind::MissingMetadata => "ERR_MISSING_METADATA",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::StaleRevision => "ERR_STALE_REVISION",
            ExErrorKind::DeterminismViolation => "ERR_DETERMINISM_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a kind for programmatic handling plus optional context: the
/// operation that failed, the msid involved and the 1-based source line.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    line: Option<usize>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            line: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity (msid) context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add source line context
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the source line, if any
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (msid: {})", entity_id)?;
        }
        if let Some(line) = self.line {
            write!(f, " (line: {})", line)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain errors raised while reading and reconciling limit revisions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LimitsError {
    /// A set or scalar directive arrived before any `MLOAD`/`MMSID`
    #[error("Line {line}: {directive} appears before any entity was opened")]
    NoCurrentEntity { line: usize, directive: String },

    #[error("Line {line}: {directive} is missing its {operand} operand")]
    MissingOperand {
        line: usize,
        directive: String,
        operand: String,
    },

    #[error("Line {line}: {directive} expects a number, got '{value}'")]
    InvalidNumber {
        line: usize,
        directive: String,
        value: String,
    },

    #[error("Line {line}: entity {msid} mixes limit and expected_state sets")]
    TypeConflict { line: usize, msid: String },

    #[error("Argument 'tabletype' is entered as {value}, should be either 'limit' or 'expected_state'")]
    InvalidTableType { value: String },

    #[error("Revision has no {field} metadata")]
    MissingMetadata { field: String },

    #[error("Revision '{revision}' is not of the form MAJOR.MINOR")]
    MalformedRevision { revision: String },

    #[error("Date {value} is not a valid calendar date")]
    InvalidDate { value: String },

    #[error("Snapshot ranges are invalid: {reason}")]
    InvalidSnapshotRanges { reason: String },

    #[error("Reference snapshot {snapshot_id} is not loaded")]
    SnapshotNotLoaded { snapshot_id: String },
}

impl From<LimitsError> for ExError {
    fn from(err: LimitsError) -> Self {
        let message = err.to_string();
        match err {
            LimitsError::NoCurrentEntity { line, .. }
            | LimitsError::MissingOperand { line, .. }
            | LimitsError::InvalidNumber { line, .. } => {
                ExError::new(ExErrorKind::MalformedInput)
                    .with_op("parse_revision")
                    .with_line(line)
                    .with_message(message)
            }
            LimitsError::TypeConflict { line, msid } => ExError::new(ExErrorKind::TypeConflict)
                .with_op("parse_revision")
                .with_entity_id(msid)
                .with_line(line)
                .with_message(message),
            LimitsError::InvalidTableType { .. } => {
                ExError::new(ExErrorKind::InvalidTableType).with_message(message)
            }
            LimitsError::MissingMetadata { .. }
            | LimitsError::MalformedRevision { .. }
            | LimitsError::InvalidDate { .. } => ExError::new(ExErrorKind::MissingMetadata)
                .with_op("stamp_revision")
                .with_message(message),
            LimitsError::InvalidSnapshotRanges { .. } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_op("snapshot_ranges")
                    .with_message(message)
            }
            LimitsError::SnapshotNotLoaded { .. } => ExError::new(ExErrorKind::NotFound)
                .with_op("resolve_snapshot")
                .with_message(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::MalformedInput, "ERR_MALFORMED_INPUT"),
            (ExErrorKind::TypeConflict, "ERR_TYPE_CONFLICT"),
            (ExErrorKind::InvalidTableType, "ERR_INVALID_TABLE_TYPE"),
            (ExErrorKind::StaleRevision, "ERR_STALE_REVISION"),
            (ExErrorKind::DeterminismViolation, "ERR_DETERMINISM_VIOLATION"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_type_conflict_keeps_line_and_msid() {
        let err: ExError = LimitsError::TypeConflict {
            line: 7,
            msid: "AOPCADMD".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::TypeConflict);
        assert_eq!(err.line(), Some(7));
        assert_eq!(err.entity_id(), Some("AOPCADMD"));
    }

    #[test]
    fn test_display_includes_code_and_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("open_store")
            .with_message("missing file");
        let text = err.to_string();
        assert!(text.starts_with("[ERR_NOT_FOUND]"));
        assert!(text.contains("open_store"));
        assert!(text.contains("missing file"));
    }
}
