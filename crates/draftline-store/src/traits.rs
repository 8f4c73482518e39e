use draftline_core::DocumentRecord;
use draftline_types::{DocumentId, Version};
use draftline_workspace::WorkingCopy;

use crate::error::{StoreError, StoreResult};

/// Storage backend for documents, their versions and working copies.
///
/// Implementations must be thread-safe (`Send + Sync`) and satisfy:
/// - A stored version is never replaced by different content.
/// - `load_document` returns versions in append order.
/// - Persisting an identical record or version twice is a no-op.
pub trait DocumentStore: Send + Sync {
    /// Load a document with its full history.
    ///
    /// Returns `Ok(None)` if the document does not exist.
    fn load_document(&self, id: &DocumentId) -> StoreResult<Option<DocumentRecord>>;

    /// Load the document's open working copy, if one was persisted.
    fn load_working_copy(&self, id: &DocumentId) -> StoreResult<Option<WorkingCopy>>;

    /// Write the document's metadata, head pointer and any versions not
    /// yet stored.
    fn persist_document(&self, record: &DocumentRecord) -> StoreResult<()>;

    /// Write one version of an already-persisted document.
    ///
    /// Fails with `MissingParent` unless the version's parent is stored.
    fn persist_version(&self, version: &Version) -> StoreResult<()>;

    fn persist_working_copy(&self, working_copy: &WorkingCopy) -> StoreResult<()>;

    /// Returns `true` if a working copy existed and was removed.
    fn delete_working_copy(&self, id: &DocumentId) -> StoreResult<bool>;

    /// All stored document ids, sorted.
    fn list_documents(&self) -> StoreResult<Vec<DocumentId>>;

    /// Load a document, failing with `DocumentNotFound` if it is absent.
    fn require_document(&self, id: &DocumentId) -> StoreResult<DocumentRecord> {
        self.load_document(id)?
            .ok_or_else(|| StoreError::DocumentNotFound(id.clone()))
    }
}

/// `MissingParent` unless `version` has no parent or its parent is in `stored`.
pub(crate) fn require_parent(stored: &[Version], version: &Version) -> StoreResult<()> {
    match &version.parent_id {
        Some(parent) if !stored.iter().any(|v| &v.id == parent) => Err(StoreError::MissingParent {
            document: version.document_id.clone(),
            number: version.number,
            parent: parent.clone(),
        }),
        _ => Ok(()),
    }
}

/// Same number, different id or content.
pub(crate) fn conflicts(stored: &Version, incoming: &Version) -> bool {
    stored.id != incoming.id || stored.content_hash != incoming.content_hash
}
