//! Error types for working copy edits.

use draftline_types::FieldPath;
use thiserror::Error;

/// Why a path could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathErrorReason {
    #[error("path is empty")]
    EmptyPath,

    #[error("first segment must be a section key")]
    SectionKeyRequired,

    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no value at this location")]
    NotFound,
}

/// An edit addressed a location that does not exist and cannot be created,
/// such as indexing into a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve field path `{path}` at segment {position}: {reason}")]
pub struct PathResolutionError {
    pub path: FieldPath,
    /// Zero-based index of the offending segment.
    pub position: usize,
    pub reason: PathErrorReason,
}

impl PathResolutionError {
    pub(crate) fn new(path: &FieldPath, position: usize, reason: PathErrorReason) -> Self {
        Self {
            path: path.clone(),
            position,
            reason,
        }
    }
}

/// Convenience alias for edit results.
pub type EditResult<T> = Result<T, PathResolutionError>;
