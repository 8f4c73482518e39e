//! Comparison of two committed versions.
//!
//! The caller resolves both versions; this module never reads a store.

use std::collections::BTreeMap;

use draftline_types::{ChangeKind, ChangeStamp, FieldChange, Version, VersionId, VersionNumber};
use serde::{Deserialize, Serialize};

use crate::detector::diff_sections_with;
use crate::labels::{HumanizedLabels, LabelResolver};

/// Per-section change counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl SectionSummary {
    /// Changes of every kind.
    pub fn total(&self) -> usize {
        self.added + self.modified + self.deleted
    }

    fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Added => self.added += 1,
            ChangeKind::Modified => self.modified += 1,
            ChangeKind::Deleted => self.deleted += 1,
        }
    }
}

/// Aggregate counts over a change list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub sections_touched: usize,
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub sections: BTreeMap<String, SectionSummary>,
}

impl DiffSummary {
    /// Count changes by kind, overall and per section.
    pub fn from_changes(changes: &[FieldChange]) -> Self {
        let mut sections: BTreeMap<String, SectionSummary> = BTreeMap::new();
        let mut totals = SectionSummary::default();
        for change in changes {
            sections
                .entry(change.section.clone())
                .or_default()
                .record(change.kind);
            totals.record(change.kind);
        }
        Self {
            sections_touched: sections.len(),
            added: totals.added,
            modified: totals.modified,
            deleted: totals.deleted,
            sections,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.modified + self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Field-level differences between two named versions. Computed on demand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub from: VersionId,
    pub to: VersionId,
    pub from_number: VersionNumber,
    pub to_number: VersionNumber,
    pub changes: Vec<FieldChange>,
    pub summary: DiffSummary,
}

impl VersionDiff {
    /// Returns `true` if the two versions have identical content.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes that belong to one section.
    pub fn section_changes<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a FieldChange> {
        self.changes.iter().filter(move |c| c.section == section)
    }
}

/// Compare `from` to `to`. Changes are stamped with the target version's
/// timestamp and author.
pub fn compare_versions(from: &Version, to: &Version) -> VersionDiff {
    compare_versions_with(from, to, &HumanizedLabels)
}

/// Like [`compare_versions`], resolving labels through `labels`.
pub fn compare_versions_with(
    from: &Version,
    to: &Version,
    labels: &dyn LabelResolver,
) -> VersionDiff {
    let stamp = ChangeStamp::at(to.timestamp).with_author(to.author.clone());
    let changes = diff_sections_with(&from.sections, &to.sections, &stamp, labels);
    let summary = DiffSummary::from_changes(&changes);
    VersionDiff {
        from: from.id.clone(),
        to: to.id.clone(),
        from_number: from.number,
        to_number: to.number,
        changes,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use draftline_types::{DocumentId, FieldPath, NewVersion, SectionTree};
    use serde_json::{json, Value};

    fn version(number: VersionNumber, parent: Option<&Version>, content: Value) -> Version {
        NewVersion {
            document_id: DocumentId::new(),
            number,
            parent_id: parent.map(|p| p.id.clone()),
            message: format!("v{number}"),
            author: "planner".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1 + number.minor, 0, 0, 0).unwrap(),
            sections: SectionTree::from_json(content).unwrap(),
            changes: vec![],
        }
        .seal()
        .unwrap()
    }

    #[test]
    fn identical_versions_empty_diff() {
        let v = version(VersionNumber::initial(), None, json!({"a": {"b": 1}}));
        let diff = compare_versions(&v, &v);
        assert!(diff.is_empty());
        assert!(diff.summary.is_empty());
        assert_eq!(diff.summary.sections_touched, 0);
    }

    #[test]
    fn summary_counts_per_section() {
        let v1 = version(
            VersionNumber::new(1, 0),
            None,
            json!({
                "budget": {"personnel": 100, "travel": 20},
                "goals": {"items": ["a"]},
                "contacts": {"lead": "Kim"}
            }),
        );
        let v2 = version(
            VersionNumber::new(1, 1),
            Some(&v1),
            json!({
                "budget": {"personnel": 150, "equipment": 5},
                "goals": {"items": ["a", "b"]},
                "contacts": {"lead": "Kim"}
            }),
        );

        let diff = compare_versions(&v1, &v2);
        assert_eq!(diff.from_number, VersionNumber::new(1, 0));
        assert_eq!(diff.to_number, VersionNumber::new(1, 1));
        assert_eq!(diff.summary.sections_touched, 2);
        assert_eq!(diff.summary.added, 2);
        assert_eq!(diff.summary.modified, 1);
        assert_eq!(diff.summary.deleted, 1);
        assert_eq!(diff.summary.total(), 4);

        let budget = diff.summary.sections["budget"];
        assert_eq!(budget.total(), 3);
        assert!(!diff.summary.sections.contains_key("contacts"));
        assert_eq!(diff.section_changes("goals").count(), 1);
    }

    #[test]
    fn changes_stamped_with_target_version() {
        let v1 = version(VersionNumber::new(1, 0), None, json!({"a": {"x": 1}}));
        let v2 = version(VersionNumber::new(1, 1), Some(&v1), json!({"a": {"x": 2}}));
        let diff = compare_versions(&v1, &v2);
        assert_eq!(diff.changes[0].timestamp, v2.timestamp);
        assert_eq!(diff.changes[0].author.as_deref(), Some("planner"));
    }

    #[test]
    fn reverse_comparison_mirrors() {
        let v1 = version(VersionNumber::new(1, 0), None, json!({"a": {"x": 1}}));
        let v2 = version(VersionNumber::new(1, 1), Some(&v1), json!({"a": {"x": 1, "y": 2}}));
        let forward = compare_versions(&v1, &v2);
        let backward = compare_versions(&v2, &v1);
        assert_eq!(forward.summary.added, 1);
        assert_eq!(backward.summary.deleted, 1);
        assert_eq!(backward.changes[0].path, FieldPath::parse("a.y").unwrap());
    }
}
