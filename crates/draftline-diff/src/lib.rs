//! Change detection for Draftline.
//!
//! Computes field-level differences between document snapshots and turns
//! them into presentation-ready descriptors. Everything in this crate is
//! pure: inputs are never mutated and no store is consulted.
//!
//! # Key Types
//!
//! - [`diff_values`] / [`diff_sections`] -- Structural diff producing [`FieldChange`](draftline_types::FieldChange)s
//! - [`VersionDiff`] / [`DiffSummary`] -- Comparison of two resolved versions
//! - [`ChangeHighlight`] / [`HighlightStyle`] -- Track-changes display descriptors
//! - [`LabelResolver`] / [`LabelMap`] -- Human-readable field labels

pub mod detector;
pub mod highlight;
pub mod labels;
pub mod version_diff;

pub use detector::{diff_sections, diff_sections_with, diff_values, diff_values_with};
pub use highlight::{build_highlights, build_highlights_with, ChangeHighlight, HighlightOptions, HighlightStyle};
pub use labels::{HumanizedLabels, LabelMap, LabelResolver};
pub use version_diff::{compare_versions, compare_versions_with, DiffSummary, SectionSummary, VersionDiff};
