use draftline_history::HistoryError;
use draftline_types::{DocumentId, TypeError, VersionId};
use draftline_workspace::PathResolutionError;
use thiserror::Error;

/// Errors from document operations. Every variant leaves the document's
/// head, history and working copy content as they were before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// An edit addressed a location that cannot exist.
    #[error(transparent)]
    PathResolution(#[from] PathResolutionError),

    /// The working copy was forked from a version that is no longer the head.
    #[error("working copy is based on {base}, but the head is now {head}")]
    StaleWorkingCopy { base: VersionId, head: VersionId },

    /// The working copy has no net changes.
    #[error("nothing to commit")]
    NothingToCommit,

    #[error("version not found: {0}")]
    VersionNotFound(VersionId),

    /// The working copy belongs to another document.
    #[error("working copy belongs to document {actual}, expected {expected}")]
    ForeignWorkingCopy {
        expected: DocumentId,
        actual: DocumentId,
    },

    #[error("history error: {0}")]
    History(#[from] HistoryError),

    #[error(transparent)]
    Types(#[from] TypeError),
}

pub type CoreResult<T> = Result<T, CoreError>;
