//! Foundation types for Draftline.
//!
//! This crate provides the data model shared by every other Draftline crate:
//! the structured content of a planning document, the paths that address
//! fields inside it, and the records that describe committed versions and
//! field-level changes.
//!
//! # Key Types
//!
//! - [`FieldValue`] / [`Scalar`]: Closed variant for nested document content
//! - [`SectionTree`]: Mapping from section identifier to nested content
//! - [`FieldPath`] / [`PathSegment`]: Ordered key/index address of a field
//! - [`DocumentId`] / [`VersionId`]: UUID v7 identifiers
//! - [`VersionNumber`] / [`VersionBump`]: Semantic `major.minor` numbering
//! - [`Version`] / [`NewVersion`]: Immutable committed snapshot
//! - [`FieldChange`] / [`ChangeKind`] / [`ChangeStamp`]: Field-level differences

pub mod change;
pub mod error;
pub mod identity;
pub mod path;
pub mod value;
pub mod version;

pub use change::{ChangeKind, ChangeStamp, FieldChange};
pub use error::TypeError;
pub use identity::{DocumentId, VersionId};
pub use path::{FieldPath, PathSegment};
pub use value::{FieldValue, Scalar, SectionTree, ValueKind};
pub use version::{NewVersion, Version, VersionBump, VersionNumber};
