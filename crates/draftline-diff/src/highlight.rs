//! Track-changes highlight descriptors.
//!
//! A [`ChangeHighlight`] is a presentation-only projection of a
//! [`FieldChange`]: a display hint plus tooltip text. Highlights have no
//! identity of their own and are never persisted.

use draftline_types::{ChangeKind, FieldChange, FieldPath, FieldValue, Scalar};
use serde::{Deserialize, Serialize};
use similar::TextDiff;

/// How the rendering layer should mark a changed field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightStyle {
    Insertion,
    Modification,
    Deletion,
}

impl HighlightStyle {
    /// The display style for a change kind.
    pub fn for_kind(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Added => HighlightStyle::Insertion,
            ChangeKind::Modified => HighlightStyle::Modification,
            ChangeKind::Deleted => HighlightStyle::Deletion,
        }
    }

    /// Stable class name for style sheets.
    pub fn css_class(self) -> &'static str {
        match self {
            HighlightStyle::Insertion => "change-added",
            HighlightStyle::Modification => "change-modified",
            HighlightStyle::Deletion => "change-deleted",
        }
    }
}

/// Display descriptor for one field change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeHighlight {
    pub path: FieldPath,
    pub section: String,
    pub kind: ChangeKind,
    pub style: HighlightStyle,
    pub label: String,
    pub tooltip: String,
    pub old_display: Option<String>,
    pub new_display: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightOptions {
    /// Values rendered longer than this many characters are truncated.
    pub max_value_len: usize,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self { max_value_len: 80 }
    }
}

/// Highlights with default options.
pub fn build_highlights(changes: &[FieldChange]) -> Vec<ChangeHighlight> {
    build_highlights_with(changes, &HighlightOptions::default())
}

/// One highlight per change, in the same order, with values truncated to
/// `options.max_value_len` characters.
pub fn build_highlights_with(
    changes: &[FieldChange],
    options: &HighlightOptions,
) -> Vec<ChangeHighlight> {
    changes
        .iter()
        .map(|change| highlight(change, options))
        .collect()
}

fn highlight(change: &FieldChange, options: &HighlightOptions) -> ChangeHighlight {
    let old_display = change
        .old_value
        .as_ref()
        .map(|v| render(v, options.max_value_len));
    let new_display = change
        .new_value
        .as_ref()
        .map(|v| render(v, options.max_value_len));

    let tooltip = match (change.kind, &old_display, &new_display) {
        (ChangeKind::Added, _, Some(new)) => format!("Added {}: {new}", change.label),
        (ChangeKind::Deleted, Some(old), _) => format!("Removed {} (was: {old})", change.label),
        (ChangeKind::Modified, Some(old), Some(new)) => {
            let mut text = format!("Changed {} from {old} to {new}", change.label);
            if let Some(note) = modification_note(change) {
                text.push_str(&format!(" ({note})"));
            }
            text
        }
        (kind, _, _) => format!("{} {}", capitalize(kind.as_str()), change.label),
    };

    ChangeHighlight {
        path: change.path.clone(),
        section: change.section.clone(),
        kind: change.kind,
        style: HighlightStyle::for_kind(change.kind),
        label: change.label.clone(),
        tooltip,
        old_display,
        new_display,
    }
}

fn modification_note(change: &FieldChange) -> Option<String> {
    let (old, new) = (change.old_value.as_ref()?, change.new_value.as_ref()?);
    if old.kind() != new.kind() {
        return Some(format!(
            "type changed from {} to {}",
            shape_name(old),
            shape_name(new)
        ));
    }
    let old_text = old.as_scalar().and_then(Scalar::as_text)?;
    let new_text = new.as_scalar().and_then(Scalar::as_text)?;
    // Short values read fine in full; the ratio only helps for prose.
    if old_text.split_whitespace().count() < 4 {
        return None;
    }
    let ratio = TextDiff::from_words(old_text, new_text).ratio();
    let rewritten = ((1.0 - ratio) * 100.0).round() as u32;
    Some(format!("{rewritten}% of text rewritten"))
}

fn shape_name(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Scalar(s) => s.type_name(),
        FieldValue::List(_) => "list",
        FieldValue::Map(_) => "group",
    }
}

fn render(value: &FieldValue, max_len: usize) -> String {
    let text = match value {
        FieldValue::Scalar(Scalar::Text(s)) => format!("\"{s}\""),
        FieldValue::Scalar(Scalar::Null) => "empty".to_string(),
        other => other.to_string(),
    };
    truncate(&text, max_len)
}

/// At most `max_len` characters, ending in `…` when shortened.
fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_len.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
