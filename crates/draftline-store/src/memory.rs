//! In-memory document store for tests and embedding.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use draftline_core::DocumentRecord;
use draftline_types::{DocumentId, Version};
use draftline_workspace::WorkingCopy;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{conflicts, require_parent, DocumentStore};

/// An in-memory implementation of [`DocumentStore`].
///
/// All data lives in `HashMap`s behind `RwLock`s and is lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, DocumentRecord>>,
    working_copies: RwLock<HashMap<DocumentId, WorkingCopy>>,
}

fn poisoned<T>(e: PoisonError<T>) -> StoreError {
    StoreError::Serialization(format!("lock poisoned: {e}"))
}

/// Insert `incoming` into `versions` (kept sorted by number) unless an
/// identical entry is already there.
fn merge_version(versions: &mut Vec<Version>, incoming: &Version) -> StoreResult<()> {
    match versions.binary_search_by(|v| v.number.cmp(&incoming.number)) {
        Ok(i) if conflicts(&versions[i], incoming) => Err(StoreError::VersionConflict {
            document: incoming.document_id.clone(),
            number: incoming.number,
        }),
        Ok(_) => Ok(()),
        Err(i) => {
            versions.insert(i, incoming.clone());
            Ok(())
        }
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.documents.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn load_document(&self, id: &DocumentId) -> StoreResult<Option<DocumentRecord>> {
        let documents = self.documents.read().map_err(poisoned)?;
        Ok(documents.get(id).cloned())
    }

    fn load_working_copy(&self, id: &DocumentId) -> StoreResult<Option<WorkingCopy>> {
        let working_copies = self.working_copies.read().map_err(poisoned)?;
        Ok(working_copies.get(id).cloned())
    }

    fn persist_document(&self, record: &DocumentRecord) -> StoreResult<()> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        let mut versions = documents
            .get(&record.id)
            .map(|stored| stored.versions.clone())
            .unwrap_or_default();
        for version in &record.versions {
            merge_version(&mut versions, version)?;
        }
        debug!(document = %record.id, versions = versions.len(), "persisted document");
        documents.insert(
            record.id.clone(),
            DocumentRecord {
                versions,
                ..record.clone()
            },
        );
        Ok(())
    }

    fn persist_version(&self, version: &Version) -> StoreResult<()> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        let record = documents
            .get_mut(&version.document_id)
            .ok_or_else(|| StoreError::DocumentNotFound(version.document_id.clone()))?;
        require_parent(&record.versions, version)?;
        merge_version(&mut record.versions, version)
    }

    fn persist_working_copy(&self, working_copy: &WorkingCopy) -> StoreResult<()> {
        let mut working_copies = self.working_copies.write().map_err(poisoned)?;
        working_copies.insert(working_copy.document_id().clone(), working_copy.clone());
        Ok(())
    }

    fn delete_working_copy(&self, id: &DocumentId) -> StoreResult<bool> {
        let mut working_copies = self.working_copies.write().map_err(poisoned)?;
        Ok(working_copies.remove(id).is_some())
    }

    fn list_documents(&self) -> StoreResult<Vec<DocumentId>> {
        let documents = self.documents.read().map_err(poisoned)?;
        let mut ids: Vec<DocumentId> = documents.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
