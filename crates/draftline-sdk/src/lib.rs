//! High-level SDK for Draftline.
//!
//! [`Draftline`] ties the engine crates to a [`DocumentStore`]: it loads
//! documents on first use, routes edits, commits and reverts through the
//! commit coordinator, and persists the affected records after each state
//! change. This is the main entry point for applications embedding the
//! engine.

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::Draftline;
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use draftline_core::{CommitRequest, CommitState, Document};
pub use draftline_diff::{ChangeHighlight, DiffSummary, HighlightStyle, VersionDiff};
pub use draftline_history::ValidationReport;
pub use draftline_store::{DocumentStore, InMemoryDocumentStore, JsonDirStore};
pub use draftline_types::{
    ChangeKind, DocumentId, FieldChange, FieldPath, FieldValue, SectionTree, Version, VersionBump,
    VersionId, VersionNumber,
};
