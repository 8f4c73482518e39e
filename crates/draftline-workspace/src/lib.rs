//! Working copy management for Draftline.
//!
//! A [`WorkingCopy`] is the single mutable staging area of a document. It
//! is forked from a committed version, receives field-level edits, and
//! always reports its accumulated changes as the net delta from that base
//! version rather than as an edit-by-edit log.
//!
//! # Key Types
//!
//! - [`WorkingCopy`]: Staged content plus accumulated [`FieldChange`](draftline_types::FieldChange)s
//! - [`CommitState`]: `Clean` / `Dirty` / `Committing`
//! - [`PathResolutionError`]: An edit addressed a location that cannot exist

pub mod edit;
pub mod error;
pub mod working_copy;

pub use edit::{remove_value, set_value};
pub use error::{EditResult, PathErrorReason, PathResolutionError};
pub use working_copy::{open, CommitState, WorkingCopy};
