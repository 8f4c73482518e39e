//! Document aggregate and commit coordinator for Draftline.
//!
//! A [`Document`] owns one linear [`VersionHistory`](draftline_history::VersionHistory),
//! a head pointer into it, and at most one open
//! [`WorkingCopy`](draftline_workspace::WorkingCopy). The coordinator
//! functions move it between states:
//!
//! - [`commit`] seals the working copy's net changes into a new immutable
//!   version and rebases the working copy onto it.
//! - [`commit_working_copy`] does the same for a working copy held outside
//!   the document, rejecting it when its base is no longer the head.
//! - [`revert`] replaces the working copy with a fresh one forked from an
//!   older version. History is never rewritten.

pub mod commit;
pub mod coordinator;
pub mod document;
pub mod error;

pub use commit::CommitRequest;
pub use coordinator::{commit, commit_working_copy, revert};
pub use document::{Document, DocumentRecord, INITIAL_VERSION_MESSAGE};
pub use draftline_workspace::CommitState;
pub use error::{CoreError, CoreResult};
