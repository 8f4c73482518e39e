use std::path::PathBuf;

use draftline_types::{DocumentId, VersionId, VersionNumber};

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// A different version is already stored under this number.
    #[error("version {number} of document {document} is already stored with different content")]
    VersionConflict {
        document: DocumentId,
        number: VersionNumber,
    },

    /// The version's parent is not stored, so writing it would leave a gap
    /// in the history.
    #[error("version {number} of document {document} has parent {parent}, which is not stored")]
    MissingParent {
        document: DocumentId,
        number: VersionNumber,
        parent: VersionId,
    },

    /// Stored data is malformed or inconsistent with its location.
    #[error("corrupt store entry {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
