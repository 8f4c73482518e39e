use std::collections::HashMap;

use draftline_types::{DocumentId, TypeError, Version, VersionBump, VersionId, VersionNumber};
use tracing::debug;

use crate::error::{HistoryError, Result};

/// The ordered, append-only history of one document.
///
/// Always contains at least one version (the root). Entries are kept in
/// append order, which is also strictly increasing version-number order.
///
/// The history also tracks the document's head: the version new commits
/// build on. Appending moves the head to the new version; [`move_head`]
/// points it back at an older one without touching any entry.
///
/// [`move_head`]: VersionHistory::move_head
#[derive(Clone, Debug)]
pub struct VersionHistory {
    versions: Vec<Version>,
    index: HashMap<VersionId, usize>,
    head: usize,
}

impl VersionHistory {
    /// Start a history from its root version.
    pub fn new(root: Version) -> Result<Self> {
        if root.parent_id.is_some() {
            return Err(HistoryError::RootHasParent(root.id));
        }
        let mut index = HashMap::new();
        index.insert(root.id.clone(), 0);
        Ok(Self {
            versions: vec![root],
            index,
            head: 0,
        })
    }

    /// Rebuild a history from versions in append order, re-checking every
    /// append rule.
    pub fn from_versions(versions: Vec<Version>) -> Result<Self> {
        let mut iter = versions.into_iter();
        let root = iter.next().ok_or(HistoryError::Empty)?;
        let mut history = Self::new(root)?;
        for version in iter {
            history.append(version)?;
        }
        Ok(history)
    }

    /// Append a version and make it the head.
    ///
    /// Rejects duplicate ids, versions of another document, missing or
    /// unknown parents, and numbers that do not exceed the latest number.
    /// On error the history is unchanged.
    pub fn append(&mut self, version: Version) -> Result<&Version> {
        if self.index.contains_key(&version.id) {
            return Err(HistoryError::DuplicateVersion(version.id));
        }
        let expected = self.document_id();
        if version.document_id != *expected {
            return Err(HistoryError::DocumentMismatch {
                expected: expected.clone(),
                actual: version.document_id,
            });
        }
        let parent = version
            .parent_id
            .as_ref()
            .ok_or_else(|| HistoryError::UnexpectedRoot(version.id.clone()))?;
        if !self.index.contains_key(parent) {
            return Err(HistoryError::UnknownParent {
                version: version.id.clone(),
                parent: parent.clone(),
            });
        }
        let latest = self.latest().number;
        if version.number <= latest {
            return Err(HistoryError::NonMonotonicNumber {
                latest,
                attempted: version.number,
            });
        }

        debug!(
            version = %version.number,
            id = %version.id.short_id(),
            changes = version.changes.len(),
            "appending version"
        );
        let position = self.versions.len();
        self.index.insert(version.id.clone(), position);
        self.versions.push(version);
        self.head = position;
        Ok(&self.versions[position])
    }

    /// The version new commits build on.
    pub fn head(&self) -> &Version {
        &self.versions[self.head]
    }

    /// Point the head at an existing version. No entry is added or removed.
    pub fn move_head(&mut self, id: &VersionId) -> Result<&Version> {
        let position = *self
            .index
            .get(id)
            .ok_or_else(|| HistoryError::VersionNotFound(id.clone()))?;
        self.head = position;
        Ok(&self.versions[position])
    }

    /// The document every version in this history belongs to.
    pub fn document_id(&self) -> &DocumentId {
        &self.root().document_id
    }

    /// The first version.
    pub fn root(&self) -> &Version {
        &self.versions[0]
    }

    /// The most recently appended version.
    pub fn latest(&self) -> &Version {
        &self.versions[self.versions.len() - 1]
    }

    /// Look up a version by id.
    pub fn get(&self, id: &VersionId) -> Option<&Version> {
        self.index.get(id).map(|&i| &self.versions[i])
    }

    /// Like [`get`](Self::get), failing with `VersionNotFound`.
    pub fn require(&self, id: &VersionId) -> Result<&Version> {
        self.get(id)
            .ok_or_else(|| HistoryError::VersionNotFound(id.clone()))
    }

    pub fn contains(&self, id: &VersionId) -> bool {
        self.index.contains_key(id)
    }

    /// Binary search by number; entries are sorted by number.
    pub fn find_by_number(&self, number: VersionNumber) -> Option<&Version> {
        self.versions
            .binary_search_by(|v| v.number.cmp(&number))
            .ok()
            .map(|i| &self.versions[i])
    }

    /// Number for the next version: the latest number bumped.
    pub fn next_number(&self, bump: VersionBump) -> std::result::Result<VersionNumber, TypeError> {
        self.latest().number.bump(bump)
    }

    /// Versions oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Version> {
        self.versions.iter()
    }

    /// Versions in append order.
    pub fn as_slice(&self) -> &[Version] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Always `false`: a history holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Walk parent links from `id` back to the root (inclusive, newest first).
    pub fn lineage(&self, id: &VersionId) -> Result<Vec<&Version>> {
        let mut chain = Vec::new();
        let mut current = Some(self.require(id)?);
        while let Some(version) = current {
            chain.push(version);
            current = match &version.parent_id {
                Some(parent) => Some(self.require(parent)?),
                None => None,
            };
        }
        Ok(chain)
    }

    /// Returns `true` if `ancestor` lies on the parent chain of `descendant`
    /// (a version is its own ancestor).
    pub fn is_ancestor(&self, ancestor: &VersionId, descendant: &VersionId) -> Result<bool> {
        self.require(ancestor)?;
        Ok(self
            .lineage(descendant)?
            .iter()
            .any(|v| &v.id == ancestor))
    }

    /// Consume the history, returning versions in append order.
    pub fn into_versions(self) -> Vec<Version> {
        self.versions
    }
}
