//! Error types for version history operations.

use draftline_types::{DocumentId, VersionId, VersionNumber};
use thiserror::Error;

/// Errors that can occur while building or querying a version history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// No version with this id exists in the history.
    #[error("version not found: {0}")]
    VersionNotFound(VersionId),

    /// A version with this id has already been appended.
    #[error("duplicate version id: {0}")]
    DuplicateVersion(VersionId),

    /// The appended version's parent is not part of the history.
    #[error("version {version} references unknown parent {parent}")]
    UnknownParent { version: VersionId, parent: VersionId },

    /// Only the first version may omit its parent.
    #[error("version {0} has no parent but the history is not empty")]
    UnexpectedRoot(VersionId),

    /// The first version of a history must not have a parent.
    #[error("first version {0} must not have a parent")]
    RootHasParent(VersionId),

    /// Version numbers must strictly increase in append order.
    #[error("version number {attempted} does not follow latest {latest}")]
    NonMonotonicNumber {
        latest: VersionNumber,
        attempted: VersionNumber,
    },

    /// The version belongs to a different document.
    #[error("version belongs to document {actual}, expected {expected}")]
    DocumentMismatch {
        expected: DocumentId,
        actual: DocumentId,
    },

    /// A history must contain at least one version.
    #[error("version history is empty")]
    Empty,
}

/// Convenience type alias for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
