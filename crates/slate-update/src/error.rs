use std::fmt;

/// Errors produced while parsing or applying an update document.
///
/// Every variant is a deterministic function of the input document and the
/// update specification. Any error aborts the whole call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpdateError {
    #[error("unknown update operator: {0}")]
    UnknownOperator(String),

    #[error("update document must have at least one element")]
    EmptySpec,

    #[error("update list must contain at least one update document")]
    EmptySpecList,

    #[error("updating the path '{path}' would create a conflict at '{conflict}'")]
    ConflictingOperators { path: String, conflict: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unsupported path '{path}': segment '{segment}' is not supported")]
    UnsupportedPath { path: String, segment: String },

    #[error("cannot write '{path}': {reason}")]
    PathConflict { path: String, reason: String },

    #[error("{operator} on '{path}': {reason}")]
    TypeMismatch {
        operator: &'static str,
        path: String,
        reason: String,
    },

    #[error("$rename from '{from}' to '{to}' is not supported: nested renames are rejected")]
    UnsupportedRename { from: String, to: String },

    #[error("{operator} on '{path}': {reason}")]
    InvalidOperand {
        operator: &'static str,
        path: String,
        reason: String,
    },

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Fieldless discriminant of [`UpdateError`], for callers that map errors to
/// protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownOperator,
    EmptySpec,
    EmptySpecList,
    ConflictingOperators,
    InvalidPath,
    UnsupportedPath,
    PathConflict,
    TypeMismatch,
    UnsupportedRename,
    InvalidOperand,
    InvalidDocument,
}

impl UpdateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpdateError::UnknownOperator(_) => ErrorKind::UnknownOperator,
            UpdateError::EmptySpec => ErrorKind::EmptySpec,
            UpdateError::EmptySpecList => ErrorKind::EmptySpecList,
            UpdateError::ConflictingOperators { .. } => ErrorKind::ConflictingOperators,
            UpdateError::InvalidPath { .. } => ErrorKind::InvalidPath,
            UpdateError::UnsupportedPath { .. } => ErrorKind::UnsupportedPath,
            UpdateError::PathConflict { .. } => ErrorKind::PathConflict,
            UpdateError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            UpdateError::UnsupportedRename { .. } => ErrorKind::UnsupportedRename,
            UpdateError::InvalidOperand { .. } => ErrorKind::InvalidOperand,
            UpdateError::InvalidDocument(_) => ErrorKind::InvalidDocument,
        }
    }

    pub(crate) fn invalid_path(path: impl fmt::Display, reason: impl Into<String>) -> Self {
        UpdateError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn path_conflict(path: impl fmt::Display, reason: impl Into<String>) -> Self {
        UpdateError::PathConflict {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn type_mismatch(
        operator: &'static str,
        path: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        UpdateError::TypeMismatch {
            operator,
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_operand(
        operator: &'static str,
        path: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        UpdateError::InvalidOperand {
            operator,
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
