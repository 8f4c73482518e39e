use draftline_diff::{diff_sections_with, HumanizedLabels, LabelResolver};
use draftline_types::{
    ChangeStamp, DocumentId, FieldChange, FieldPath, FieldValue, SectionTree, Version, VersionId,
    VersionNumber,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::edit::{remove_value, set_value};
use crate::error::EditResult;

/// Commit lifecycle of a working copy.
///
/// `Clean -> Dirty` on the first net change, `Dirty -> Committing` while the
/// commit coordinator runs, then back to `Clean` on success (or to the prior
/// state on failure).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    #[default]
    Clean,
    Dirty,
    Committing,
}

/// The mutable staging area of one document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkingCopy {
    document_id: DocumentId,
    base_version_id: VersionId,
    base_number: VersionNumber,
    base: SectionTree,
    sections: SectionTree,
    changes: Vec<FieldChange>,
    state: CommitState,
}

/// Return the document's working copy, forking one from `head` if the slot
/// is empty. An existing working copy is returned unchanged.
pub fn open<'a>(slot: &'a mut Option<WorkingCopy>, head: &Version) -> &'a mut WorkingCopy {
    slot.get_or_insert_with(|| WorkingCopy::fork(head))
}

impl WorkingCopy {
    /// Fork a clean working copy from a committed version.
    pub fn fork(base: &Version) -> Self {
        debug!(version = %base.number, "forking working copy");
        Self {
            document_id: base.document_id.clone(),
            base_version_id: base.id.clone(),
            base_number: base.number,
            base: base.sections.clone(),
            sections: base.sections.clone(),
            changes: Vec::new(),
            state: CommitState::Clean,
        }
    }

    /// The document this working copy belongs to.
    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// The version this working copy was forked from.
    pub fn base_version_id(&self) -> &VersionId {
        &self.base_version_id
    }

    /// Number of the version this working copy was forked from.
    pub fn base_number(&self) -> VersionNumber {
        self.base_number
    }

    /// Snapshot of the base version's content.
    pub fn base_sections(&self) -> &SectionTree {
        &self.base
    }

    /// Current staged content.
    pub fn sections(&self) -> &SectionTree {
        &self.sections
    }

    /// Net changes since the base version.
    pub fn pending_changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// Where the working copy is in its commit lifecycle.
    pub fn state(&self) -> CommitState {
        self.state
    }

    /// Returns `true` if there are uncommitted net changes.
    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Set the value at `path`, stamped now with no author and humanised labels.
    pub fn apply_edit(&mut self, path: &FieldPath, value: FieldValue) -> EditResult<&[FieldChange]> {
        self.apply_edit_with(path, value, &ChangeStamp::now(None), &HumanizedLabels)
    }

    /// Set the value at `path` and recompute the net change list against
    /// the base snapshot.
    ///
    /// Intermediate maps and lists are created as needed. On error the
    /// working copy is unchanged.
    pub fn apply_edit_with(
        &mut self,
        path: &FieldPath,
        value: FieldValue,
        stamp: &ChangeStamp,
        labels: &dyn LabelResolver,
    ) -> EditResult<&[FieldChange]> {
        let mut staged = self.sections.clone();
        set_value(&mut staged, path, value)?;
        debug!(path = %path, "applied edit");
        self.sections = staged;
        self.recompute(stamp, labels);
        Ok(&self.changes)
    }

    /// Remove the value at `path` and recompute the net change list.
    pub fn remove_field(&mut self, path: &FieldPath) -> EditResult<&[FieldChange]> {
        self.remove_field_with(path, &ChangeStamp::now(None), &HumanizedLabels)
    }

    /// Like [`remove_field`](Self::remove_field), with explicit stamp and labels.
    pub fn remove_field_with(
        &mut self,
        path: &FieldPath,
        stamp: &ChangeStamp,
        labels: &dyn LabelResolver,
    ) -> EditResult<&[FieldChange]> {
        remove_value(&mut self.sections, path)?;
        debug!(path = %path, "removed field");
        self.recompute(stamp, labels);
        Ok(&self.changes)
    }

    /// Reset content to the base snapshot and clear accumulated changes.
    pub fn discard(&mut self) {
        debug!(
            version = %self.base_number,
            dropped = self.changes.len(),
            "discarding working copy edits"
        );
        self.sections = self.base.clone();
        self.changes.clear();
        self.state = CommitState::Clean;
    }

    /// Point this working copy at `version` with its content and an empty
    /// change list. Used after a successful commit, keeping the same handle.
    pub fn rebase(&mut self, version: &Version) {
        self.document_id = version.document_id.clone();
        self.base_version_id = version.id.clone();
        self.base_number = version.number;
        self.base = version.sections.clone();
        self.sections = version.sections.clone();
        self.changes.clear();
        self.state = CommitState::Clean;
    }

    /// Enter `Committing`. Called by the commit coordinator.
    pub fn begin_commit(&mut self) {
        self.state = CommitState::Committing;
    }

    /// Leave `Committing` without a new version.
    pub fn abort_commit(&mut self) {
        self.state = self.settled_state();
    }

    fn settled_state(&self) -> CommitState {
        if self.changes.is_empty() {
            CommitState::Clean
        } else {
            CommitState::Dirty
        }
    }

    /// Rebuild the change list as the diff from the base snapshot. Entries
    /// describing the same transition as before keep their original stamp.
    fn recompute(&mut self, stamp: &ChangeStamp, labels: &dyn LabelResolver) {
        let fresh = diff_sections_with(&self.base, &self.sections, stamp, labels);
        let previous = std::mem::take(&mut self.changes);
        self.changes = fresh
            .into_iter()
            .map(|change| {
                previous
                    .iter()
                    .find(|old| old.same_transition(&change))
                    .cloned()
                    .unwrap_or(change)
            })
            .collect();
        self.state = self.settled_state();
    }
}
