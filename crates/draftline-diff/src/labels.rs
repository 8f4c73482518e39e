//! Human-readable labels for field paths.

use std::collections::BTreeMap;

use draftline_types::{FieldPath, PathSegment};

/// Maps a field path to the label shown next to a change.
pub trait LabelResolver {
    fn label(&self, path: &FieldPath) -> String;
}

/// Labels derived from the path itself (see [`FieldPath::humanize`]).
#[derive(Clone, Copy, Debug, Default)]
pub struct HumanizedLabels;

impl LabelResolver for HumanizedLabels {
    fn label(&self, path: &FieldPath) -> String {
        path.humanize()
    }
}

/// Explicit labels keyed by dotted path, with humanised fallback.
///
/// A key may name a concrete path (`goals[0].title`) or a pattern where
/// every index is written as `[]` (`goals[].title`). Concrete keys win over
/// patterns.
#[derive(Clone, Debug, Default)]
pub struct LabelMap {
    labels: BTreeMap<String, String>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label for a dotted path. `[]` in the path matches any list index.
    pub fn insert(&mut self, path: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(path.into(), label.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<String>, label: impl Into<String>) -> Self {
        self.insert(path, label);
        self
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(String, String)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

/// The display form of `path` with every index written as `[]`. Keys are
/// rendered exactly as [`FieldPath`] displays them.
fn index_pattern(path: &FieldPath) -> String {
    let mut pattern = String::new();
    for segment in path.segments() {
        match segment {
            PathSegment::Index(_) => pattern.push_str("[]"),
            PathSegment::Key(key) => {
                let rendered = FieldPath::from_keys([key.as_str()]).to_string();
                if !pattern.is_empty() && !rendered.starts_with('[') {
                    pattern.push('.');
                }
                pattern.push_str(&rendered);
            }
        }
    }
    pattern
}

impl LabelResolver for LabelMap {
    fn label(&self, path: &FieldPath) -> String {
        if let Some(label) = self.labels.get(&path.to_string()) {
            return label.clone();
        }
        match self.labels.get(&index_pattern(path)) {
            Some(label) => match path.last() {
                Some(PathSegment::Index(i)) => format!("{label} {}", i + 1),
                _ => label.clone(),
            },
            None => path.humanize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanized_fallback() {
        let path = FieldPath::parse("budget.personnel_costs").unwrap();
        assert_eq!(HumanizedLabels.label(&path), "Budget › Personnel Costs");
        assert_eq!(LabelMap::new().label(&path), "Budget › Personnel Costs");
    }

    #[test]
    fn exact_label_wins() {
        let labels = LabelMap::new()
            .with("goals[].title", "Goal title")
            .with("goals[0].title", "Primary goal");
        let first = FieldPath::parse("goals[0].title").unwrap();
        let second = FieldPath::parse("goals[1].title").unwrap();
        assert_eq!(labels.label(&first), "Primary goal");
        assert_eq!(labels.label(&second), "Goal title");
    }

    #[test]
    fn empty_key_is_not_an_index_wildcard() {
        let labels = LabelMap::new().with("budget[]", "Budget line");
        let keyed = FieldPath::from_keys(["budget", ""]);
        let indexed = FieldPath::parse("budget[0]").unwrap();
        assert_eq!(labels.label(&keyed), keyed.humanize());
        assert_eq!(labels.label(&indexed), "Budget line 1");

        let labels = LabelMap::new().with(r#"budget[""]"#, "Unnamed");
        assert_eq!(labels.label(&keyed), "Unnamed");
        assert_eq!(labels.label(&indexed), indexed.humanize());
    }

    #[test]
    fn pattern_with_quoted_key() {
        let labels = LabelMap::new().with(r#"budget["fy2025.q1"].lines[]"#, "Q1 line");
        let path = FieldPath::from_keys(["budget", "fy2025.q1", "lines"]).index(4);
        assert_eq!(labels.label(&path), "Q1 line 5");
    }

    #[test]
    fn pattern_on_list_element_numbers_it() {
        let labels = LabelMap::new().with("goals[]", "Goal");
        let path = FieldPath::parse("goals[2]").unwrap();
        assert_eq!(labels.label(&path), "Goal 3");
    }
}
