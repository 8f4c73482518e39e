use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid field path {input:?}: {reason}")]
    InvalidPath { input: String, reason: String },

    #[error("invalid version number: {0}")]
    InvalidVersionNumber(String),

    /// Bumping the version number would overflow a component.
    #[error("version number {0} cannot be bumped further")]
    VersionNumberOverflow(String),

    /// A JSON integer does not fit in a signed 64-bit value.
    #[error("integer {0} is outside the supported range")]
    IntegerOutOfRange(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("section tree root must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
