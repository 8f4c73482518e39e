use std::collections::HashMap;

use draftline_types::{Version, VersionId, VersionNumber};
use tracing::warn;

/// Result of validating a stored history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub version_count: usize,
    pub numbers_monotonic: bool,
    pub parents_linked: bool,
    pub content_intact: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation found during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub number: VersionNumber,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    NumberNotIncreasing,
    DuplicateId,
    RootHasParent,
    MissingParent,
    ParentNotEarlier,
    ForeignDocument,
    ContentHashMismatch,
}

/// Integrity validator for histories read back from storage.
///
/// Unlike [`VersionHistory::from_versions`](crate::VersionHistory::from_versions),
/// which stops at the first broken rule, the validator reports every
/// violation it finds.
pub struct HistoryValidator;

impl HistoryValidator {
    /// Validate versions given in append order.
    pub fn validate(versions: &[Version]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut positions: HashMap<&VersionId, usize> = HashMap::new();
        let document = versions.first().map(|v| &v.document_id);

        for (index, version) in versions.iter().enumerate() {
            let mut flag = |kind: ViolationKind, description: String| {
                violations.push(Violation {
                    number: version.number,
                    kind,
                    description,
                });
            };

            if index > 0 && version.number <= versions[index - 1].number {
                flag(
                    ViolationKind::NumberNotIncreasing,
                    format!(
                        "version {} follows {}",
                        version.number,
                        versions[index - 1].number
                    ),
                );
            }

            if document.is_some_and(|d| d != &version.document_id) {
                flag(
                    ViolationKind::ForeignDocument,
                    format!("belongs to document {}", version.document_id),
                );
            }

            match (&version.parent_id, index) {
                (Some(parent), 0) => flag(
                    ViolationKind::RootHasParent,
                    format!("first version references parent {parent}"),
                ),
                (None, i) if i > 0 => flag(
                    ViolationKind::MissingParent,
                    "non-root version has no parent".into(),
                ),
                (Some(parent), _) if !positions.contains_key(parent) => {
                    let later = versions[index..].iter().any(|v| &v.id == parent);
                    let kind = if later {
                        ViolationKind::ParentNotEarlier
                    } else {
                        ViolationKind::MissingParent
                    };
                    flag(kind, format!("parent {parent} not found before this version"));
                }
                _ => {}
            }

            match version.verify_content_hash() {
                Ok(true) => {}
                Ok(false) => flag(
                    ViolationKind::ContentHashMismatch,
                    "stored content hash does not match sections".into(),
                ),
                Err(e) => flag(ViolationKind::ContentHashMismatch, e.to_string()),
            }

            if positions.insert(&version.id, index).is_some() {
                flag(
                    ViolationKind::DuplicateId,
                    format!("version id {} appears twice", version.id),
                );
            }
        }

        for violation in &violations {
            warn!(
                version = %violation.number,
                kind = ?violation.kind,
                "{}",
                violation.description
            );
        }

        let has = |kind: ViolationKind| violations.iter().any(|v| v.kind == kind);
        ValidationReport {
            version_count: versions.len(),
            numbers_monotonic: !has(ViolationKind::NumberNotIncreasing),
            parents_linked: !has(ViolationKind::MissingParent)
                && !has(ViolationKind::ParentNotEarlier)
                && !has(ViolationKind::RootHasParent),
            content_intact: !has(ViolationKind::ContentHashMismatch),
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use draftline_types::{DocumentId, NewVersion, SectionTree};
    use serde_json::json;

    fn make(doc: &DocumentId, number: VersionNumber, parent: Option<&VersionId>) -> Version {
        NewVersion {
            document_id: doc.clone(),
            number,
            parent_id: parent.cloned(),
            message: String::new(),
            author: "planner".into(),
            timestamp: Utc::now(),
            sections: SectionTree::from_json(json!({"s": {"v": number.minor}})).unwrap(),
            changes: vec![],
        }
        .seal()
        .unwrap()
    }

    fn chain() -> Vec<Version> {
        let doc = DocumentId::new();
        let v10 = make(&doc, VersionNumber::new(1, 0), None);
        let v11 = make(&doc, VersionNumber::new(1, 1), Some(&v10.id));
        let v12 = make(&doc, VersionNumber::new(1, 2), Some(&v10.id));
        vec![v10, v11, v12]
    }

    #[test]
    fn valid_chain_passes() {
        let report = HistoryValidator::validate(&chain());
        assert!(report.is_valid(), "{:?}", report.violations);
        assert_eq!(report.version_count, 3);
        assert!(report.numbers_monotonic && report.parents_linked && report.content_intact);
    }

    #[test]
    fn empty_history_is_trivially_valid() {
        assert!(HistoryValidator::validate(&[]).is_valid());
    }

    #[test]
    fn detects_tampered_content() {
        let mut versions = chain();
        versions[1]
            .sections
            .insert_section("s", json!({"v": 999}).into());
        let report = HistoryValidator::validate(&versions);
        assert!(!report.content_intact);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].number, VersionNumber::new(1, 1));
    }

    #[test]
    fn detects_out_of_order_numbers_and_parents() {
        let mut versions = chain();
        versions.swap(1, 2);
        versions[1].parent_id = Some(versions[2].id.clone());
        let report = HistoryValidator::validate(&versions);
        assert!(!report.numbers_monotonic);
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::ParentNotEarlier));
    }

    #[test]
    fn detects_missing_parent_and_rooted_first() {
        let mut versions = chain();
        versions[0].parent_id = Some(VersionId::new());
        versions[2].parent_id = None;
        let report = HistoryValidator::validate(&versions);
        let kinds: Vec<_> = report.violations.iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::RootHasParent));
        assert!(kinds.contains(&ViolationKind::MissingParent));
        assert!(!report.parents_linked);
    }

    #[test]
    fn detects_duplicate_ids() {
        let mut versions = chain();
        let dup = versions[1].id.clone();
        versions[2].id = dup;
        let report = HistoryValidator::validate(&versions);
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::DuplicateId));
    }
}
