use thiserror::Error;

/// Result type alias using FlatError
pub type Result<T> = std::result::Result<T, FlatError>;

/// Stable classification of every failure an encode/decode call can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnregisteredType,
    InvalidShape,
    CycleDetected,
    ArityMismatch,
    SparseList,
    UnknownField,
    TypeTagMismatch,
    MalformedPath,
    InvalidScalar,
}

impl ErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnregisteredType => "ERR_UNREGISTERED_TYPE",
            ErrorKind::InvalidShape => "ERR_INVALID_SHAPE",
            ErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ErrorKind::ArityMismatch => "ERR_ARITY_MISMATCH",
            ErrorKind::SparseList => "ERR_SPARSE_LIST",
            ErrorKind::UnknownField => "ERR_UNKNOWN_FIELD",
            ErrorKind::TypeTagMismatch => "ERR_TYPE_TAG_MISMATCH",
            ErrorKind::MalformedPath => "ERR_MALFORMED_PATH",
            ErrorKind::InvalidScalar => "ERR_INVALID_SCALAR",
        }
    }
}

/// A failure of a single encode or decode call.
///
/// Paths are carried in their rendered text form (`contact.address.city`,
/// `projects[2]`, `offices{NYC}`) so they can be reported as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlatError {
    #[error("type `{type_name}` has no registered shape")]
    UnregisteredType { type_name: String },

    #[error("invalid shape for `{type_name}`: {reason}")]
    InvalidShape { type_name: String, reason: String },

    #[error("cycle detected at `{path}`: value refers back to one of its ancestors")]
    CycleDetected { path: String },

    #[error("expected a single flat value at `{path}`, found {found}")]
    ArityMismatch { path: String, found: usize },

    #[error("list at `{path}` is not a contiguous zero-based run: index {missing} is missing")]
    SparseList { path: String, missing: usize },

    #[error("unknown field `{field}` at `{path}` for type `{type_name}`")]
    UnknownField {
        path: String,
        field: String,
        type_name: String,
    },

    #[error("type mismatch at `{path}`: declared {declared}, found {found}")]
    TypeTagMismatch {
        path: String,
        declared: String,
        found: String,
    },

    #[error("malformed path `{text}`: {reason}")]
    MalformedPath { text: String, reason: String },

    #[error("invalid {expected} value at `{path}`: {text:?}")]
    InvalidScalar {
        path: String,
        expected: String,
        text: String,
    },
}

impl FlatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlatError::UnregisteredType { .. } => ErrorKind::UnregisteredType,
            FlatError::InvalidShape { .. } => ErrorKind::InvalidShape,
            FlatError::CycleDetected { .. } => ErrorKind::CycleDetected,
            FlatError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            FlatError::SparseList { .. } => ErrorKind::SparseList,
            FlatError::UnknownField { .. } => ErrorKind::UnknownField,
            FlatError::TypeTagMismatch { .. } => ErrorKind::TypeTagMismatch,
            FlatError::MalformedPath { .. } => ErrorKind::MalformedPath,
            FlatError::InvalidScalar { .. } => ErrorKind::InvalidScalar,
        }
    }

    pub(crate) fn unregistered(type_name: impl Into<String>) -> Self {
        FlatError::UnregisteredType {
            type_name: type_name.into(),
        }
    }

    pub(crate) fn mismatch(
        path: impl ToString,
        declared: impl ToString,
        found: impl ToString,
    ) -> Self {
        FlatError::TypeTagMismatch {
            path: path.to_string(),
            declared: declared.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn malformed(text: impl Into<String>, reason: impl Into<String>) -> Self {
        FlatError::MalformedPath {
            text: text.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_code() {
        let err = FlatError::SparseList {
            path: "tags".to_string(),
            missing: 1,
        };
        assert_eq!(err.kind(), ErrorKind::SparseList);
        assert_eq!(err.kind().code(), "ERR_SPARSE_LIST");
        assert!(err.to_string().contains("index 1 is missing"));
    }

    #[test]
    fn test_unknown_field_message_names_path_and_type() {
        let err = FlatError::UnknownField {
            path: "contact.fax".to_string(),
            field: "fax".to_string(),
            type_name: "ContactInfo".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("contact.fax"));
        assert!(msg.contains("ContactInfo"));
    }
}
