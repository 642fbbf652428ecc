//! Entry-input validation errors.

/// Raised when the pipeline entry input is malformed. No external call is
/// made once one of these is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("entity name must be a non-empty string")]
    EmptyEntityName,

    #[error("entity name must be a string, got {kind}")]
    NotAString { kind: String },
}
