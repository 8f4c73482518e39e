//! Structural diff between two document snapshots.
//!
//! Walks both trees key-by-key over the union of keys at each level:
//!
//! - a key only in the old tree is `deleted`, only in the new tree `added`;
//! - two maps recurse, two lists are compared index-by-index up to the
//!   shorter length and the remaining tail is `added`/`deleted`;
//! - two scalars emit `modified` only when unequal;
//! - any change of shape (scalar to map, list to scalar, ...) is a single
//!   `modified` at that path and the sub-tree is not expanded.
//!
//! Output order is deterministic: sorted keys, depth-first, ascending indices.

use std::collections::{BTreeMap, BTreeSet};

use draftline_types::{ChangeStamp, FieldChange, FieldPath, FieldValue, Scalar, SectionTree};

use crate::labels::{HumanizedLabels, LabelResolver};

struct Walker<'a> {
    labels: &'a dyn LabelResolver,
    stamp: &'a ChangeStamp,
    changes: Vec<FieldChange>,
}

impl Walker<'_> {
    fn added(&mut self, path: FieldPath, value: &FieldValue) {
        let label = self.labels.label(&path);
        self.changes
            .push(FieldChange::added(path, label, value.clone(), self.stamp));
    }

    fn deleted(&mut self, path: FieldPath, value: &FieldValue) {
        let label = self.labels.label(&path);
        self.changes
            .push(FieldChange::deleted(path, label, value.clone(), self.stamp));
    }

    fn modified(&mut self, path: FieldPath, old: &FieldValue, new: &FieldValue) {
        let label = self.labels.label(&path);
        self.changes.push(FieldChange::modified(
            path,
            label,
            old.clone(),
            new.clone(),
            self.stamp,
        ));
    }

    fn value(&mut self, path: &FieldPath, old: &FieldValue, new: &FieldValue) {
        match (old, new) {
            (FieldValue::Map(a), FieldValue::Map(b)) => self.map(path, a, b),
            (FieldValue::List(a), FieldValue::List(b)) => self.list(path, a, b),
            (FieldValue::Scalar(a), FieldValue::Scalar(b)) => {
                if !scalars_equal(a, b) {
                    self.modified(path.clone(), old, new);
                }
            }
            _ => self.modified(path.clone(), old, new),
        }
    }

    fn map(
        &mut self,
        path: &FieldPath,
        old: &BTreeMap<String, FieldValue>,
        new: &BTreeMap<String, FieldValue>,
    ) {
        let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        for key in keys {
            let child = path.key(key.as_str());
            match (old.get(key), new.get(key)) {
                (Some(a), Some(b)) => self.value(&child, a, b),
                (Some(a), None) => self.deleted(child, a),
                (None, Some(b)) => self.added(child, b),
                (None, None) => {}
            }
        }
    }

    fn list(&mut self, path: &FieldPath, old: &[FieldValue], new: &[FieldValue]) {
        let common = old.len().min(new.len());
        for i in 0..common {
            self.value(&path.index(i), &old[i], &new[i]);
        }
        for (i, value) in old.iter().enumerate().skip(common) {
            self.deleted(path.index(i), value);
        }
        for (i, value) in new.iter().enumerate().skip(common) {
            self.added(path.index(i), value);
        }
    }
}

/// Deep scalar equality where `NaN` equals itself, so that diffing a value
/// against itself is always empty.
fn scalars_equal(a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::Float(x), Scalar::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

/// Diff two values rooted at `prefix`, labelling changes from their paths.
pub fn diff_values(
    prefix: &FieldPath,
    old: &FieldValue,
    new: &FieldValue,
    stamp: &ChangeStamp,
) -> Vec<FieldChange> {
    diff_values_with(prefix, old, new, stamp, &HumanizedLabels)
}

/// Diff two values rooted at `prefix` using a custom label resolver.
pub fn diff_values_with(
    prefix: &FieldPath,
    old: &FieldValue,
    new: &FieldValue,
    stamp: &ChangeStamp,
    labels: &dyn LabelResolver,
) -> Vec<FieldChange> {
    let mut walker = Walker {
        labels,
        stamp,
        changes: Vec::new(),
    };
    walker.value(prefix, old, new);
    walker.changes
}

/// Diff two section trees. Every produced path starts with a section id.
pub fn diff_sections(old: &SectionTree, new: &SectionTree, stamp: &ChangeStamp) -> Vec<FieldChange> {
    diff_sections_with(old, new, stamp, &HumanizedLabels)
}

/// Like [`diff_sections`], resolving labels through `labels`.
pub fn diff_sections_with(
    old: &SectionTree,
    new: &SectionTree,
    stamp: &ChangeStamp,
    labels: &dyn LabelResolver,
) -> Vec<FieldChange> {
    let mut walker = Walker {
        labels,
        stamp,
        changes: Vec::new(),
    };
    walker.map(&FieldPath::root(), old.as_map(), new.as_map());
    walker.changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use draftline_types::ChangeKind;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn stamp() -> ChangeStamp {
        ChangeStamp::at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    fn tree(v: Value) -> SectionTree {
        SectionTree::from_json(v).unwrap()
    }

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn empty_trees_no_changes() {
        let changes = diff_sections(&SectionTree::new(), &SectionTree::new(), &stamp());
        assert!(changes.is_empty());
    }

    #[test]
    fn identical_trees_no_changes() {
        let t = tree(json!({"budget": {"personnel": 100, "lines": [1, 2, {"x": null}]}}));
        assert!(diff_sections(&t, &t, &stamp()).is_empty());
    }

    #[test]
    fn scalar_modification() {
        let old = tree(json!({"budget": {"personnel": 100}}));
        let new = tree(json!({"budget": {"personnel": 150}}));

        let changes = diff_sections(&old, &new, &stamp());
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.kind, ChangeKind::Modified);
        assert_eq!(change.path, FieldPath::from_keys(["budget", "personnel"]));
        assert_eq!(change.old_value, Some(100.into()));
        assert_eq!(change.new_value, Some(150.into()));
        assert_eq!(change.section, "budget");
        assert_eq!(change.label, "Budget › Personnel");
    }

    #[test]
    fn added_and_deleted_keys() {
        let old = tree(json!({"a": {"keep": 1, "gone": 2}}));
        let new = tree(json!({"a": {"keep": 1, "fresh": 3}}));

        let changes = diff_sections(&old, &new, &stamp());
        assert_eq!(changes.len(), 2);
        // Sorted key order: "fresh" < "gone".
        assert_eq!(changes[0].path, path("a.fresh"));
        assert_eq!(changes[0].kind, ChangeKind::Added);
        assert_eq!(changes[0].old_value, None);
        assert_eq!(changes[1].path, path("a.gone"));
        assert_eq!(changes[1].kind, ChangeKind::Deleted);
        assert_eq!(changes[1].new_value, None);
    }

    #[test]
    fn whole_section_added_is_one_change() {
        let old = tree(json!({}));
        let new = tree(json!({"risks": {"items": ["flood"]}}));

        let changes = diff_sections(&old, &new, &stamp());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, path("risks"));
        assert_eq!(changes[0].new_value, Some(json!({"items": ["flood"]}).into()));
    }

    #[test]
    fn list_pairwise_then_tail() {
        let old = tree(json!({"s": {"items": ["a", "b", "c"]}}));
        let new = tree(json!({"s": {"items": ["a", "x"]}}));

        let changes = diff_sections(&old, &new, &stamp());
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].path, path("s.items[1]"));
        assert_eq!(changes[0].kind, ChangeKind::Modified);
        assert_eq!(changes[1].path, path("s.items[2]"));
        assert_eq!(changes[1].kind, ChangeKind::Deleted);
    }

    #[test]
    fn list_growth_emits_added_indices() {
        let old = tree(json!({"s": [1]}));
        let new = tree(json!({"s": [1, 2, 3]}));

        let changes = diff_sections(&old, &new, &stamp());
        let paths: Vec<String> = changes.iter().map(|c| c.path.to_string()).collect();
        assert_eq!(paths, vec!["s[1]", "s[2]"]);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Added));
    }

    #[test]
    fn reorder_is_positional() {
        let old = tree(json!({"s": ["a", "b"]}));
        let new = tree(json!({"s": ["b", "a"]}));

        let changes = diff_sections(&old, &new, &stamp());
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Modified));
    }

    #[test]
    fn table_rows_recurse_to_cells() {
        let old = tree(json!({"staff": [{"role": "Analyst", "fte": 1}]}));
        let new = tree(json!({"staff": [{"role": "Analyst", "fte": 2}]}));

        let changes = diff_sections(&old, &new, &stamp());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, path("staff[0].fte"));
        assert_eq!(changes[0].label, "Staff › Item 1 › Fte");
    }

    #[test]
    fn type_change_is_single_modified_without_recursion() {
        let old = tree(json!({"budget": {"personnel": 100}}));
        let new = tree(json!({"budget": {"personnel": {"salaries": 80, "benefits": 20}}}));

        let changes = diff_sections(&old, &new, &stamp());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Modified);
        assert_eq!(changes[0].path, path("budget.personnel"));
        assert_eq!(
            changes[0].new_value,
            Some(json!({"salaries": 80, "benefits": 20}).into())
        );
    }

    #[test]
    fn list_to_map_is_type_change() {
        let old = tree(json!({"s": [1]}));
        let new = tree(json!({"s": {"0": 1}}));
        let changes = diff_sections(&old, &new, &stamp());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, path("s"));
    }

    #[test]
    fn int_to_float_is_modified() {
        let old = tree(json!({"s": {"v": 1}}));
        let new = tree(json!({"s": {"v": 1.5}}));
        assert_eq!(diff_sections(&old, &new, &stamp()).len(), 1);
    }

    #[test]
    fn nan_equals_itself() {
        let v = FieldValue::from(f64::NAN);
        assert!(diff_values(&path("x"), &v, &v, &stamp()).is_empty());
    }

    #[test]
    fn prefix_is_prepended() {
        let old = FieldValue::from(json!({"a": 1}));
        let new = FieldValue::from(json!({"a": 2}));
        let changes = diff_values(&path("section.sub"), &old, &new, &stamp());
        assert_eq!(changes[0].path, path("section.sub.a"));
        assert_eq!(changes[0].section, "section");
    }

    #[test]
    fn stamp_is_recorded() {
        let stamp = stamp().with_author("analyst");
        let changes = diff_values(&path("x"), &1.into(), &2.into(), &stamp);
        assert_eq!(changes[0].timestamp, stamp.timestamp);
        assert_eq!(changes[0].author.as_deref(), Some("analyst"));
    }

    #[test]
    fn inputs_are_untouched() {
        let old = tree(json!({"a": {"b": [1, 2]}}));
        let new = tree(json!({"a": {"b": [3]}}));
        let (old_copy, new_copy) = (old.clone(), new.clone());
        let _ = diff_sections(&old, &new, &stamp());
        assert_eq!(old, old_copy);
        assert_eq!(new, new_copy);
    }

    fn arb_value() -> impl Strategy<Value = FieldValue> {
        let leaf = prop_oneof![
            Just(FieldValue::null()),
            any::<bool>().prop_map(FieldValue::from),
            (-1000i64..1000).prop_map(FieldValue::from),
            "[a-z]{0,6}".prop_map(FieldValue::text),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(FieldValue::List),
                prop::collection::btree_map("[a-d]", inner, 0..4).prop_map(FieldValue::Map),
            ]
        })
    }

    fn arb_tree() -> impl Strategy<Value = SectionTree> {
        prop::collection::btree_map("[a-c]", arb_value(), 0..4).prop_map(SectionTree::from)
    }

    proptest! {
        #[test]
        fn diff_is_idempotent(t in arb_tree()) {
            prop_assert!(diff_sections(&t, &t, &stamp()).is_empty());
        }

        #[test]
        fn added_mirrors_deleted(a in arb_tree(), b in arb_tree()) {
            let forward = diff_sections(&a, &b, &stamp());
            let backward = diff_sections(&b, &a, &stamp());
            prop_assert_eq!(forward.len(), backward.len());
            for change in &forward {
                let mirror = backward.iter().find(|c| c.path == change.path);
                prop_assert!(mirror.is_some());
                prop_assert_eq!(mirror.unwrap(), &change.inverted());
            }
        }

        #[test]
        fn paths_are_unique(a in arb_tree(), b in arb_tree()) {
            let changes = diff_sections(&a, &b, &stamp());
            let unique: BTreeSet<_> = changes.iter().map(|c| c.path.clone()).collect();
            prop_assert_eq!(unique.len(), changes.len());
        }
    }
}
