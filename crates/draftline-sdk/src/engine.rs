use std::collections::HashMap;

use draftline_core::{commit, revert, CommitRequest, CoreError, Document};
use draftline_diff::{build_highlights_with, ChangeHighlight, LabelMap, VersionDiff};
use draftline_history::{HistoryValidator, ValidationReport};
use draftline_store::DocumentStore;
use draftline_types::{
    ChangeStamp, DocumentId, FieldChange, FieldPath, FieldValue, SectionTree, Version, VersionId,
    VersionNumber,
};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{SdkError, SdkResult};

/// High-level Draftline API over a document store.
///
/// Documents are loaded on first use and cached. Every state-changing call
/// completes its in-memory transition first and then writes the affected
/// records; if that write fails the error is returned and the cached
/// document is dropped, so the next call reloads what the store holds.
///
/// Several engines may share one store. Before a commit or revert the
/// cached document is checked against the stored head; if another writer
/// moved it, the call fails with `StaleWorkingCopy` and the document is
/// reloaded on next use.
pub struct Draftline<S: DocumentStore> {
    store: S,
    config: EngineConfig,
    labels: LabelMap,
    documents: HashMap<DocumentId, Document>,
}

impl<S: DocumentStore> Draftline<S> {
    /// Engine with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Engine with explicit configuration. Labels are resolved once here.
    pub fn with_config(store: S, config: EngineConfig) -> Self {
        let labels = config.label_map();
        Self {
            store,
            config,
            labels,
            documents: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ---- Documents ----

    /// Create a document with `sections` as version `1.0`.
    pub fn create_document(
        &mut self,
        title: &str,
        sections: SectionTree,
        author: Option<&str>,
    ) -> SdkResult<DocumentId> {
        let author = self.author(author);
        let document = Document::create(title, sections, author)?;
        let id = document.id().clone();
        self.store.persist_document(&document.to_record())?;
        self.documents.insert(id.clone(), document);
        Ok(id)
    }

    /// The document, loaded from the store on first access.
    pub fn open(&mut self, id: &DocumentId) -> SdkResult<&Document> {
        Ok(self.document_mut(id)?)
    }

    /// Stored document ids, sorted.
    pub fn document_ids(&self) -> SdkResult<Vec<DocumentId>> {
        Ok(self.store.list_documents()?)
    }

    /// Validate the stored history of a document without loading it.
    pub fn verify(&self, id: &DocumentId) -> SdkResult<ValidationReport> {
        let record = self
            .store
            .load_document(id)?
            .ok_or_else(|| SdkError::DocumentNotFound(id.clone()))?;
        Ok(HistoryValidator::validate(&record.versions))
    }

    // ---- Working copy ----

    /// Set `path` in the document's working copy and persist it.
    ///
    /// Returns the full accumulated change list. `author` is recorded on the
    /// changes this edit produces.
    pub fn apply_edit(
        &mut self,
        id: &DocumentId,
        path: &FieldPath,
        value: FieldValue,
        author: Option<&str>,
    ) -> SdkResult<Vec<FieldChange>> {
        let stamp = ChangeStamp::now(author.map(str::to_string));
        self.ensure_loaded(id)?;
        let changes = loaded(&mut self.documents, id)?
            .apply_edit_with(path, value, &stamp, &self.labels)?
            .to_vec();
        self.persist_working_copy(id)?;
        Ok(changes)
    }

    /// Remove `path` from the working copy and persist it.
    pub fn remove_field(
        &mut self,
        id: &DocumentId,
        path: &FieldPath,
        author: Option<&str>,
    ) -> SdkResult<Vec<FieldChange>> {
        let stamp = ChangeStamp::now(author.map(str::to_string));
        self.ensure_loaded(id)?;
        let changes = loaded(&mut self.documents, id)?
            .remove_field_with(path, &stamp, &self.labels)?
            .to_vec();
        self.persist_working_copy(id)?;
        Ok(changes)
    }

    /// Drop uncommitted edits.
    pub fn discard(&mut self, id: &DocumentId) -> SdkResult<()> {
        self.document_mut(id)?.discard();
        self.persist_working_copy(id)
    }

    /// Uncommitted changes, net of the working copy's base.
    pub fn pending_changes(&mut self, id: &DocumentId) -> SdkResult<Vec<FieldChange>> {
        Ok(self.document_mut(id)?.pending_changes().to_vec())
    }

    // ---- Commit and revert ----

    /// Commit with the configured default bump.
    pub fn commit(
        &mut self,
        id: &DocumentId,
        message: &str,
        author: Option<&str>,
    ) -> SdkResult<Version> {
        let request =
            CommitRequest::new(message, self.author(author)).with_bump(self.config.default_bump);
        self.commit_with(id, request)
    }

    /// Commit the working copy as a new version and persist it.
    ///
    /// Fails with `StaleWorkingCopy` if another engine moved the stored head.
    pub fn commit_with(&mut self, id: &DocumentId, request: CommitRequest) -> SdkResult<Version> {
        let document = self.current_document_mut(id)?;
        let version = commit(document, request)?.clone();
        let record = document.to_record();

        let written = self
            .store
            .persist_version(&version)
            .and_then(|()| self.store.persist_document(&record))
            .map_err(SdkError::from)
            .and_then(|()| self.persist_working_copy(id));
        self.evict_on_error(id, written)?;
        Ok(version)
    }

    /// Revert the working copy to `target`. Uncommitted edits are lost.
    pub fn revert(&mut self, id: &DocumentId, target: &VersionId) -> SdkResult<()> {
        let document = self.current_document_mut(id)?;
        revert(document, target)?;
        let record = document.to_record();

        let written = self
            .store
            .persist_document(&record)
            .map_err(SdkError::from)
            .and_then(|()| self.persist_working_copy(id));
        self.evict_on_error(id, written)
    }

    // ---- History and review ----

    /// Versions oldest to newest.
    pub fn history(&mut self, id: &DocumentId) -> SdkResult<&[Version]> {
        Ok(self.document_mut(id)?.versions())
    }

    /// Resolve a version reference: `head`, `latest`, a number (`1.2` or
    /// `v1.2`) or a full version id.
    pub fn resolve_version(&mut self, id: &DocumentId, reference: &str) -> SdkResult<VersionId> {
        let document = self.document_mut(id)?;
        let found = match reference.trim() {
            "head" | "HEAD" => Some(document.head()),
            "latest" => Some(document.history().latest()),
            other => match VersionNumber::parse(other) {
                Ok(number) => document.version_by_number(number),
                Err(_) => other
                    .parse::<VersionId>()
                    .ok()
                    .and_then(|vid| document.history().get(&vid)),
            },
        };
        found
            .map(|v| v.id.clone())
            .ok_or_else(|| SdkError::UnknownVersion(reference.to_string()))
    }

    /// Net changes from `from` to `to`.
    pub fn compare_versions(
        &mut self,
        id: &DocumentId,
        from: &VersionId,
        to: &VersionId,
    ) -> SdkResult<VersionDiff> {
        self.ensure_loaded(id)?;
        Ok(loaded(&mut self.documents, id)?.compare_versions(from, to, &self.labels)?)
    }

    /// Highlights using the configured value truncation.
    pub fn build_highlights(&self, changes: &[FieldChange]) -> Vec<ChangeHighlight> {
        build_highlights_with(changes, &self.config.highlight)
    }

    // ---- Internals ----

    fn author(&self, author: Option<&str>) -> String {
        author
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_author.clone())
    }

    fn ensure_loaded(&mut self, id: &DocumentId) -> SdkResult<()> {
        if !self.documents.contains_key(id) {
            let document = self.load(id)?;
            self.documents.insert(id.clone(), document);
        }
        Ok(())
    }

    /// Like [`document_mut`](Self::document_mut), but a cached document is
    /// first checked against the store.
    fn current_document_mut(&mut self, id: &DocumentId) -> SdkResult<&mut Document> {
        if self.documents.contains_key(id) {
            self.ensure_current(id)?;
        }
        self.document_mut(id)
    }

    /// Fail with `StaleWorkingCopy` and drop the cached document when the
    /// stored head or latest version differs from the cached one.
    fn ensure_current(&mut self, id: &DocumentId) -> SdkResult<()> {
        let Some(cached) = self.documents.get(id) else {
            return Ok(());
        };
        let stored = self.store.require_document(id)?;
        let stored_latest = stored.versions.last().map(|v| &v.id);
        if stored.head == cached.head().id && stored_latest == Some(&cached.history().latest().id) {
            return Ok(());
        }

        let base = cached
            .working_copy()
            .map_or(&cached.head().id, |wc| wc.base_version_id())
            .clone();
        warn!(document = %id, base = %base, head = %stored.head, "store moved ahead, reloading");
        self.documents.remove(id);
        Err(CoreError::StaleWorkingCopy {
            base,
            head: stored.head,
        }
        .into())
    }

    fn evict_on_error(&mut self, id: &DocumentId, written: SdkResult<()>) -> SdkResult<()> {
        if let Err(e) = &written {
            warn!(document = %id, error = %e, "write failed, dropping cached document");
            self.documents.remove(id);
        }
        written
    }

    fn document_mut(&mut self, id: &DocumentId) -> SdkResult<&mut Document> {
        self.ensure_loaded(id)?;
        loaded(&mut self.documents, id)
    }

    fn load(&self, id: &DocumentId) -> SdkResult<Document> {
        let record = self
            .store
            .load_document(id)?
            .ok_or_else(|| SdkError::DocumentNotFound(id.clone()))?;
        if self.config.validate_on_load {
            let report = HistoryValidator::validate(&record.versions);
            if !report.is_valid() {
                return Err(SdkError::CorruptHistory {
                    document: id.clone(),
                    violations: report.violations,
                });
            }
        }
        let working_copy = self.store.load_working_copy(id)?;
        let document = Document::from_record(record, working_copy)?;
        info!(
            document = %id,
            versions = document.versions().len(),
            head = %document.head().number,
            "loaded document"
        );
        Ok(document)
    }

    fn persist_working_copy(&self, id: &DocumentId) -> SdkResult<()> {
        let Some(wc) = self.documents.get(id).and_then(Document::working_copy) else {
            return Ok(());
        };
        debug!(document = %id, pending = wc.pending_changes().len(), "persisting working copy");
        self.store.persist_working_copy(wc)?;
        Ok(())
    }
}

fn loaded<'a>(
    documents: &'a mut HashMap<DocumentId, Document>,
    id: &DocumentId,
) -> SdkResult<&'a mut Document> {
    documents
        .get_mut(id)
        .ok_or_else(|| SdkError::DocumentNotFound(id.clone()))
}
