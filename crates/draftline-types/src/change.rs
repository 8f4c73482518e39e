use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::value::FieldValue;

/// The kind of a field-level change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl ChangeKind {
    /// The kind observed when diffing in the opposite direction.
    pub fn inverse(self) -> Self {
        match self {
            ChangeKind::Added => ChangeKind::Deleted,
            ChangeKind::Deleted => ChangeKind::Added,
            ChangeKind::Modified => ChangeKind::Modified,
        }
    }

    /// Lowercase name as used in JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When and by whom a set of changes was observed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStamp {
    pub timestamp: DateTime<Utc>,
    pub author: Option<String>,
}

impl ChangeStamp {
    /// Stamp with the current wall-clock time.
    pub fn now(author: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            author,
        }
    }

    /// Stamp with an explicit time and no author.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            author: None,
        }
    }

    /// Record `author` on the changes made with this stamp.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// The smallest unit of difference between two snapshots.
///
/// `old_value` is `None` for [`ChangeKind::Added`]; `new_value` is `None`
/// for [`ChangeKind::Deleted`]. Within one change set no two records share
/// a path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub path: FieldPath,
    pub label: String,
    /// Owning section id (first key of `path`, or empty for non-section roots).
    pub section: String,
    pub kind: ChangeKind,
    pub old_value: Option<FieldValue>,
    pub new_value: Option<FieldValue>,
    pub timestamp: DateTime<Utc>,
    pub author: Option<String>,
}

impl FieldChange {
    fn with_kind(
        kind: ChangeKind,
        path: FieldPath,
        label: String,
        old_value: Option<FieldValue>,
        new_value: Option<FieldValue>,
        stamp: &ChangeStamp,
    ) -> Self {
        let section = path.section().unwrap_or_default().to_string();
        Self {
            path,
            label,
            section,
            kind,
            old_value,
            new_value,
            timestamp: stamp.timestamp,
            author: stamp.author.clone(),
        }
    }

    /// A field that did not exist before.
    pub fn added(path: FieldPath, label: String, value: FieldValue, stamp: &ChangeStamp) -> Self {
        Self::with_kind(ChangeKind::Added, path, label, None, Some(value), stamp)
    }

    /// A field that no longer exists.
    pub fn deleted(path: FieldPath, label: String, value: FieldValue, stamp: &ChangeStamp) -> Self {
        Self::with_kind(ChangeKind::Deleted, path, label, Some(value), None, stamp)
    }

    /// A field whose value changed, including a change of shape.
    pub fn modified(
        path: FieldPath,
        label: String,
        old: FieldValue,
        new: FieldValue,
        stamp: &ChangeStamp,
    ) -> Self {
        Self::with_kind(ChangeKind::Modified, path, label, Some(old), Some(new), stamp)
    }

    /// The same change seen from the other direction: kind inverted and
    /// values swapped.
    pub fn inverted(&self) -> Self {
        Self {
            kind: self.kind.inverse(),
            old_value: self.new_value.clone(),
            new_value: self.old_value.clone(),
            ..self.clone()
        }
    }

    /// Returns `true` if both records describe the same transition,
    /// ignoring when and by whom it was observed.
    pub fn same_transition(&self, other: &FieldChange) -> bool {
        self.path == other.path
            && self.kind == other.kind
            && self.old_value == other.old_value
            && self.new_value == other.new_value
    }
}
