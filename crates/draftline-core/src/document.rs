use chrono::{DateTime, Utc};
use draftline_diff::{compare_versions_with, LabelResolver, VersionDiff};
use draftline_history::{HistoryError, VersionHistory};
use draftline_types::{
    ChangeStamp, DocumentId, FieldChange, FieldPath, FieldValue, NewVersion, SectionTree, Version,
    VersionId, VersionNumber,
};
use draftline_workspace::{open, WorkingCopy};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult};

/// Commit message of the implicit first version.
pub const INITIAL_VERSION_MESSAGE: &str = "Initial version";

/// A document: its committed history, the head new commits build on, and
/// at most one open working copy.
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) id: DocumentId,
    pub(crate) title: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) history: VersionHistory,
    pub(crate) working_copy: Option<WorkingCopy>,
}

/// Serialized form of a [`Document`] without its working copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub head: VersionId,
    /// Append order, oldest first.
    pub versions: Vec<Version>,
}

impl Document {
    /// Create a document whose first version `1.0` holds `sections`.
    pub fn create(
        title: impl Into<String>,
        sections: SectionTree,
        author: impl Into<String>,
    ) -> CoreResult<Self> {
        let id = DocumentId::new();
        let created_at = Utc::now();
        let root = NewVersion {
            document_id: id.clone(),
            number: VersionNumber::initial(),
            parent_id: None,
            message: INITIAL_VERSION_MESSAGE.to_string(),
            author: author.into(),
            timestamp: created_at,
            sections,
            changes: Vec::new(),
        }
        .seal()?;
        let history = VersionHistory::new(root)?;
        let title = title.into();
        info!(document = %id, title = %title, "created document");
        Ok(Self {
            id,
            title,
            created_at,
            history,
            working_copy: None,
        })
    }

    /// Rebuild a document from its stored record and optional working copy.
    ///
    /// The history is re-checked append by append. A working copy of
    /// another document, or one based on a version the history lacks, is
    /// rejected. A working copy behind the head is kept: committing it will
    /// fail until it is reverted.
    pub fn from_record(record: DocumentRecord, working_copy: Option<WorkingCopy>) -> CoreResult<Self> {
        let mut history = VersionHistory::from_versions(record.versions)?;
        if history.document_id() != &record.id {
            return Err(HistoryError::DocumentMismatch {
                expected: record.id,
                actual: history.document_id().clone(),
            }
            .into());
        }
        history
            .move_head(&record.head)
            .map_err(|_| CoreError::VersionNotFound(record.head.clone()))?;

        if let Some(wc) = &working_copy {
            if wc.document_id() != &record.id {
                return Err(CoreError::ForeignWorkingCopy {
                    expected: record.id,
                    actual: wc.document_id().clone(),
                });
            }
            if !history.contains(wc.base_version_id()) {
                return Err(CoreError::VersionNotFound(wc.base_version_id().clone()));
            }
            if wc.base_version_id() != &history.head().id {
                warn!(
                    document = %record.id,
                    base = %wc.base_number(),
                    head = %history.head().number,
                    "loaded working copy is behind the head"
                );
            }
        }

        Ok(Self {
            id: record.id,
            title: record.title,
            created_at: record.created_at,
            history,
            working_copy,
        })
    }

    /// Snapshot of the document for persistence. The working copy is stored separately.
    pub fn to_record(&self) -> DocumentRecord {
        DocumentRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            head: self.head().id.clone(),
            versions: self.history.as_slice().to_vec(),
        }
    }

    /// Stable document identifier.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Human-readable title given at creation.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// When version `1.0` was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The committed version new commits build on.
    pub fn head(&self) -> &Version {
        self.history.head()
    }

    /// The full append-only history, including versions past the head.
    pub fn history(&self) -> &VersionHistory {
        &self.history
    }

    /// All versions, oldest to newest.
    pub fn versions(&self) -> &[Version] {
        self.history.as_slice()
    }

    /// Look up a version, failing with `VersionNotFound`.
    pub fn version(&self, id: &VersionId) -> CoreResult<&Version> {
        self.history
            .get(id)
            .ok_or_else(|| CoreError::VersionNotFound(id.clone()))
    }

    /// Look up a version by its `major.minor` number.
    pub fn version_by_number(&self, number: VersionNumber) -> Option<&Version> {
        self.history.find_by_number(number)
    }

    /// The open working copy, if any. It is created lazily by [`open_working_copy`](Self::open_working_copy).
    pub fn working_copy(&self) -> Option<&WorkingCopy> {
        self.working_copy.as_ref()
    }

    /// The open working copy, forked from the head on first use.
    pub fn open_working_copy(&mut self) -> &mut WorkingCopy {
        open(&mut self.working_copy, self.history.head())
    }

    /// Net uncommitted changes; empty when no working copy is open.
    pub fn pending_changes(&self) -> &[FieldChange] {
        self.working_copy
            .as_ref()
            .map(WorkingCopy::pending_changes)
            .unwrap_or_default()
    }

    /// Set `path` in the working copy, opening one from the head if needed.
    ///
    /// The returned slice is the full accumulated change list. On error the
    /// working copy is left as it was.
    pub fn apply_edit_with(
        &mut self,
        path: &FieldPath,
        value: FieldValue,
        stamp: &ChangeStamp,
        labels: &dyn LabelResolver,
    ) -> CoreResult<&[FieldChange]> {
        Ok(self
            .open_working_copy()
            .apply_edit_with(path, value, stamp, labels)?)
    }

    /// Remove `path` from the working copy, opening one from the head if needed.
    pub fn remove_field_with(
        &mut self,
        path: &FieldPath,
        stamp: &ChangeStamp,
        labels: &dyn LabelResolver,
    ) -> CoreResult<&[FieldChange]> {
        Ok(self
            .open_working_copy()
            .remove_field_with(path, stamp, labels)?)
    }

    /// Drop uncommitted edits. No-op when no working copy is open.
    pub fn discard(&mut self) {
        if let Some(wc) = self.working_copy.as_mut() {
            wc.discard();
        }
    }

    /// Diff two committed versions of this document.
    pub fn compare_versions(
        &self,
        from: &VersionId,
        to: &VersionId,
        labels: &dyn LabelResolver,
    ) -> CoreResult<VersionDiff> {
        let from = self.version(from)?;
        let to = self.version(to)?;
        Ok(compare_versions_with(from, to, labels))
    }
}
