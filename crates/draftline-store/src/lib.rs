//! Persistence backends for Draftline.
//!
//! The engine treats storage as a write-behind cache: a state transition is
//! complete in memory before anything is written, and the caller decides
//! when to persist. Backends implement [`DocumentStore`]:
//!
//! - [`InMemoryDocumentStore`] -- `HashMap`-based store for tests and embedding
//! - [`JsonDirStore`] -- one directory of JSON files per document
//!
//! # Design Rules
//!
//! 1. Versions are write-once. Rewriting a stored version number with
//!    different content fails with [`StoreError::VersionConflict`].
//! 2. Versions load in number order, which is also append order.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod json_dir;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use json_dir::JsonDirStore;
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;
