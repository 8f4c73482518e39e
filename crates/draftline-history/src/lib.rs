//! Version store for Draftline.
//!
//! Each document owns a strictly linear, append-only [`VersionHistory`].
//! Versions are appended in number order and never mutated or removed; a
//! version's parent is always an earlier entry, which need not be the
//! immediately preceding one (reverting forks the line forward from an
//! older version). The history also tracks the head: the version the next
//! commit will use as its parent.
//!
//! # Modules
//!
//! - [`error`]: Error types for history operations
//! - [`history`]: The [`VersionHistory`] container
//! - [`validation`]: [`HistoryValidator`] for histories loaded from storage

pub mod error;
pub mod history;
pub mod validation;

pub use error::{HistoryError, Result};
pub use history::VersionHistory;
pub use validation::{HistoryValidator, ValidationReport, Violation, ViolationKind};
