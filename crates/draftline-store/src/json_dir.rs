//! Directory-of-JSON-files document store.
//!
//! On-disk layout under the store root:
//! ```text
//! <document-id>/
//!     document.json        id, title, created_at, head
//!     versions/1.0.json    one write-once file per version
//!     versions/1.1.json
//!     working_copy.json    present only while a working copy is persisted
//! ```
//! Every file is written to a temporary sibling and renamed into place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use draftline_core::DocumentRecord;
use draftline_types::{DocumentId, Version, VersionId, VersionNumber};
use draftline_workspace::WorkingCopy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{conflicts, require_parent, DocumentStore};

const DOCUMENT_FILE: &str = "document.json";
const WORKING_COPY_FILE: &str = "working_copy.json";
const VERSIONS_DIR: &str = "versions";

/// `document.json`: everything in a record except the versions.
#[derive(Serialize, Deserialize)]
struct DocumentMeta {
    id: DocumentId,
    title: String,
    created_at: DateTime<Utc>,
    head: VersionId,
}

/// A [`DocumentStore`] keeping each document in its own directory.
#[derive(Clone, Debug)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened json store");
        Ok(Self { root })
    }

    /// Directory holding one subdirectory per document.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_dir(&self, id: &DocumentId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn version_path(&self, id: &DocumentId, number: VersionNumber) -> PathBuf {
        self.document_dir(id)
            .join(VERSIONS_DIR)
            .join(format!("{number}.json"))
    }

    fn write_version_once(&self, version: &Version) -> StoreResult<()> {
        let path = self.version_path(&version.document_id, version.number);
        match read_json::<Version>(&path)? {
            Some(stored) if conflicts(&stored, version) => Err(StoreError::VersionConflict {
                document: version.document_id.clone(),
                number: version.number,
            }),
            Some(_) => Ok(()),
            None => {
                write_json(&path, version)?;
                debug!(path = %path.display(), "wrote version");
                Ok(())
            }
        }
    }

    fn load_versions(&self, id: &DocumentId) -> StoreResult<Vec<Version>> {
        let dir = self.document_dir(id).join(VERSIONS_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let Some(version) = read_json::<Version>(&path)? else {
                continue;
            };
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if stem != version.number.to_string() {
                return Err(corrupt(&path, format!("holds version {}", version.number)));
            }
            if &version.document_id != id {
                return Err(corrupt(
                    &path,
                    format!("belongs to document {}", version.document_id),
                ));
            }
            versions.push(version);
        }
        versions.sort_by_key(|v| v.number);
        Ok(versions)
    }
}

impl DocumentStore for JsonDirStore {
    fn load_document(&self, id: &DocumentId) -> StoreResult<Option<DocumentRecord>> {
        let meta_path = self.document_dir(id).join(DOCUMENT_FILE);
        let Some(meta) = read_json::<DocumentMeta>(&meta_path)? else {
            return Ok(None);
        };
        if &meta.id != id {
            return Err(corrupt(&meta_path, format!("describes document {}", meta.id)));
        }
        let versions = self.load_versions(id)?;
        Ok(Some(DocumentRecord {
            id: meta.id,
            title: meta.title,
            created_at: meta.created_at,
            head: meta.head,
            versions,
        }))
    }

    fn load_working_copy(&self, id: &DocumentId) -> StoreResult<Option<WorkingCopy>> {
        read_json(&self.document_dir(id).join(WORKING_COPY_FILE))
    }

    fn persist_document(&self, record: &DocumentRecord) -> StoreResult<()> {
        for version in &record.versions {
            self.write_version_once(version)?;
        }
        let meta = DocumentMeta {
            id: record.id.clone(),
            title: record.title.clone(),
            created_at: record.created_at,
            head: record.head.clone(),
        };
        write_json(&self.document_dir(&record.id).join(DOCUMENT_FILE), &meta)?;
        debug!(document = %record.id, "persisted document");
        Ok(())
    }

    fn persist_version(&self, version: &Version) -> StoreResult<()> {
        if !self.document_dir(&version.document_id).join(DOCUMENT_FILE).exists() {
            return Err(StoreError::DocumentNotFound(version.document_id.clone()));
        }
        require_parent(&self.load_versions(&version.document_id)?, version)?;
        self.write_version_once(version)
    }

    fn persist_working_copy(&self, working_copy: &WorkingCopy) -> StoreResult<()> {
        let path = self
            .document_dir(working_copy.document_id())
            .join(WORKING_COPY_FILE);
        write_json(&path, working_copy)
    }

    fn delete_working_copy(&self, id: &DocumentId) -> StoreResult<bool> {
        match fs::remove_file(self.document_dir(id).join(WORKING_COPY_FILE)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_documents(&self) -> StoreResult<Vec<DocumentId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.join(DOCUMENT_FILE).is_file() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            match name.parse::<DocumentId>() {
                Ok(id) => ids.push(id),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping directory"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn corrupt(path: &Path, reason: String) -> StoreError {
    StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    }
}

/// Read and parse a JSON file. A missing file is `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| corrupt(path, e.to_string()))
}

/// Write `value` as pretty JSON, replacing `path` atomically.
fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| corrupt(path, "no parent directory".into()))?;
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftline_core::{commit, revert, CommitRequest, Document};
    use draftline_types::{FieldPath, SectionTree};
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, JsonDirStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::open(dir.path().join("store")).unwrap();
        (dir, store)
    }

    fn document() -> Document {
        let sections = SectionTree::from_json(json!({"budget": {"personnel": 100}})).unwrap();
        Document::create("Transit Plan", sections, "planner").unwrap()
    }

    fn edit_and_commit(doc: &mut Document, value: i64) -> Version {
        doc.open_working_copy()
            .apply_edit(&FieldPath::parse("budget.personnel").unwrap(), value.into())
            .unwrap();
        commit(doc, CommitRequest::new("raise", "planner")).unwrap().clone()
    }

    #[test]
    fn open_creates_root() {
        let (_dir, store) = temp_store();
        assert!(store.root().is_dir());
        assert!(store.list_documents().unwrap().is_empty());
    }

    #[test]
    fn document_roundtrip_with_layout() {
        let (_dir, store) = temp_store();
        let mut doc = document();
        edit_and_commit(&mut doc, 150);
        store.persist_document(&doc.to_record()).unwrap();

        let doc_dir = store.root().join(doc.id().to_string());
        assert!(doc_dir.join("document.json").is_file());
        assert!(doc_dir.join("versions/1.0.json").is_file());
        assert!(doc_dir.join("versions/1.1.json").is_file());

        let loaded = store.require_document(doc.id()).unwrap();
        assert_eq!(loaded, doc.to_record());
        assert_eq!(store.list_documents().unwrap(), vec![doc.id().clone()]);
    }

    #[test]
    fn versions_load_in_number_order() {
        let (_dir, store) = temp_store();
        let mut doc = document();
        for value in [110, 120, 130, 140, 150, 160, 170, 180, 190, 200, 210] {
            edit_and_commit(&mut doc, value);
        }
        store.persist_document(&doc.to_record()).unwrap();

        let loaded = store.require_document(doc.id()).unwrap();
        let numbers: Vec<_> = loaded.versions.iter().map(|v| v.number).collect();
        let expected: Vec<_> = doc.versions().iter().map(|v| v.number).collect();
        assert_eq!(numbers, expected);
        assert_eq!(numbers.last(), Some(&VersionNumber::new(1, 11)));
    }

    #[test]
    fn head_survives_revert() {
        let (_dir, store) = temp_store();
        let mut doc = document();
        let root = doc.head().id.clone();
        edit_and_commit(&mut doc, 150);
        revert(&mut doc, &root).unwrap();
        store.persist_document(&doc.to_record()).unwrap();

        let record = store.require_document(doc.id()).unwrap();
        assert_eq!(record.head, root);
        let reloaded = Document::from_record(record, None).unwrap();
        assert_eq!(reloaded.head().id, root);
        assert_eq!(reloaded.versions().len(), 2);
    }

    #[test]
    fn version_files_are_write_once() {
        let (_dir, store) = temp_store();
        let mut doc = document();
        store.persist_document(&doc.to_record()).unwrap();
        let v11 = edit_and_commit(&mut doc, 150);
        store.persist_version(&v11).unwrap();
        store.persist_version(&v11).unwrap();

        let mut forged = v11.clone();
        forged.id = VersionId::new();
        assert!(matches!(
            store.persist_version(&forged),
            Err(StoreError::VersionConflict { .. })
        ));
        let loaded = store.require_document(doc.id()).unwrap();
        assert_eq!(loaded.versions[1], v11);
    }

    #[test]
    fn version_of_unknown_document_fails() {
        let (_dir, store) = temp_store();
        let mut doc = document();
        let v11 = edit_and_commit(&mut doc, 150);
        assert!(matches!(
            store.persist_version(&v11),
            Err(StoreError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn version_with_unstored_parent_is_refused() {
        let (_dir, store) = temp_store();
        let mut doc = document();
        store.persist_document(&doc.to_record()).unwrap();
        edit_and_commit(&mut doc, 150);
        let v12 = edit_and_commit(&mut doc, 200);

        assert!(matches!(
            store.persist_version(&v12),
            Err(StoreError::MissingParent { .. })
        ));
        let versions = store.root().join(doc.id().to_string()).join("versions");
        assert!(!versions.join("1.2.json").exists());
        assert_eq!(store.require_document(doc.id()).unwrap().versions.len(), 1);
    }

    #[test]
    fn working_copy_lifecycle() {
        let (_dir, store) = temp_store();
        let mut doc = document();
        store.persist_document(&doc.to_record()).unwrap();
        doc.open_working_copy()
            .apply_edit(&FieldPath::parse("budget.travel").unwrap(), 20.into())
            .unwrap();
        let wc = doc.working_copy().cloned().unwrap();

        store.persist_working_copy(&wc).unwrap();
        assert_eq!(store.load_working_copy(doc.id()).unwrap(), Some(wc));
        assert!(store.delete_working_copy(doc.id()).unwrap());
        assert!(!store.delete_working_copy(doc.id()).unwrap());
        assert!(store.load_working_copy(doc.id()).unwrap().is_none());
    }

    #[test]
    fn misnamed_version_file_is_corrupt() {
        let (_dir, store) = temp_store();
        let doc = document();
        store.persist_document(&doc.to_record()).unwrap();
        let versions = store.root().join(doc.id().to_string()).join("versions");
        fs::rename(versions.join("1.0.json"), versions.join("1.5.json")).unwrap();

        assert!(matches!(
            store.load_document(doc.id()),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn unreadable_json_is_corrupt() {
        let (_dir, store) = temp_store();
        let doc = document();
        store.persist_document(&doc.to_record()).unwrap();
        let meta = store.root().join(doc.id().to_string()).join("document.json");
        fs::write(&meta, b"{ not json").unwrap();

        assert!(matches!(
            store.load_document(doc.id()),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn stray_directories_are_ignored() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.root().join("notes")).unwrap();
        fs::create_dir_all(store.root().join("scratch")).unwrap();
        fs::write(store.root().join("scratch").join("document.json"), b"{}").unwrap();
        assert!(store.list_documents().unwrap().is_empty());
    }
}
