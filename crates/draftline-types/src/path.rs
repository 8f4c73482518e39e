//! Field paths.
//!
//! A [`FieldPath`] is an ordered list of keys and indices that uniquely
//! locates a value inside a [`SectionTree`](crate::SectionTree). Paths
//! serialize as JSON arrays (`["budget", "lines", 2]`) and display in dotted
//! form (`budget.lines[2]`). Keys that contain path punctuation display in
//! bracket-quoted form (`["fy2025.q1"]`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// One step of a field path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Position inside an ordered list.
    Index(usize),
    /// Key inside a mapping.
    Key(String),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(_) => None,
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered key/index address of a value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Build a path from map keys only.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(|k| PathSegment::Key(k.into())).collect())
    }

    /// A new path extended by a map key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// A new path extended by a list index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// The segments in order, section id first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The final segment; `None` for the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// The path without its last segment; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// The owning section id: the first segment, when it is a key.
    pub fn section(&self) -> Option<&str> {
        self.0.first().and_then(PathSegment::as_key)
    }

    /// Returns `true` if `prefix` is a (non-strict) prefix of this path.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Default human-readable label: keys are humanised and joined with
    /// `›`, indices are shown 1-based (`Goals › Item 3 › Title`).
    pub fn humanize(&self) -> String {
        self.0
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(k) => humanize_key(k),
                PathSegment::Index(i) => format!("Item {}", i + 1),
            })
            .collect::<Vec<_>>()
            .join(" › ")
    }

    /// Parse the dotted display form.
    ///
    /// Grammar: `key(.key | [index] | ["quoted key"])*`. Inside quotes,
    /// `\"` and `\\` escape a quote and a backslash. The empty string
    /// parses to the root path.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidPath {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let chars: Vec<char> = input.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if chars[i] == '[' {
                i += 1;
                if chars.get(i) == Some(&'"') {
                    let (key, end) = parse_quoted(&chars, i + 1)
                        .ok_or_else(|| invalid("unterminated quoted key"))?;
                    segments.push(PathSegment::Key(key));
                    i = end;
                } else {
                    let start = i;
                    while i < chars.len() && chars[i] != ']' {
                        i += 1;
                    }
                    let digits: String = chars[start..i].iter().collect();
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| invalid("index must be a non-negative integer"))?;
                    segments.push(PathSegment::Index(index));
                }
                if chars.get(i) != Some(&']') {
                    return Err(invalid("unterminated '['"));
                }
                i += 1;
            } else {
                let start = i;
                while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                    if chars[i] == ']' {
                        return Err(invalid("unexpected ']'"));
                    }
                    i += 1;
                }
                if i == start {
                    return Err(invalid("empty key"));
                }
                segments.push(PathSegment::Key(chars[start..i].iter().collect()));
            }

            if i < chars.len() && chars[i] == '.' {
                i += 1;
                if i == chars.len() {
                    return Err(invalid("trailing '.'"));
                }
            } else if i < chars.len() && chars[i] != '[' {
                return Err(invalid("expected '.' or '['"));
            }
        }

        Ok(Self(segments))
    }
}

fn humanize_key(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read a quoted key starting after its opening `"`. Returns the key and
/// the position just past the closing `"`.
fn parse_quoted(chars: &[char], mut i: usize) -> Option<(String, usize)> {
    let mut key = String::new();
    loop {
        match *chars.get(i)? {
            '"' => return Some((key, i + 1)),
            '\\' => {
                key.push(*chars.get(i + 1)?);
                i += 2;
            }
            c => {
                key.push(c);
                i += 1;
            }
        }
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']', '"', '\\'])
}

fn write_quoted(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    f.write_str("[\"")?;
    for c in key.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"]")
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if needs_quoting(k) => write_quoted(f, k)?,
                PathSegment::Key(k) if i == 0 => write!(f, "{k}")?,
                PathSegment::Key(k) => write!(f, ".{k}")?,
                PathSegment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_dotted_keys() {
        let path = FieldPath::parse("budget.personnel").unwrap();
        assert_eq!(path, FieldPath::from_keys(["budget", "personnel"]));
        assert_eq!(path.section(), Some("budget"));
    }

    #[test]
    fn parse_indices() {
        let path = FieldPath::parse("goals[2].title").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("goals".into()),
                PathSegment::Index(2),
                PathSegment::Key("title".into()),
            ]
        );
    }

    #[test]
    fn parse_quoted_keys() {
        let path = FieldPath::parse(r#"budget["fy2025.q1"].total"#).unwrap();
        assert_eq!(path, FieldPath::from_keys(["budget", "fy2025.q1", "total"]));
        assert_eq!(path.to_string(), r#"budget["fy2025.q1"].total"#);
    }

    #[test]
    fn quoted_keys_escape_quotes_and_brackets() {
        let path = FieldPath::from_keys(["budget", "q1]", r#"say "hi""#, r"a\b", ""]);
        let text = path.to_string();
        assert_eq!(text, r#"budget["q1]"]["say \"hi\""]["a\\b"][""]"#);
        assert_eq!(FieldPath::parse(&text).unwrap(), path);
    }

    #[test]
    fn parse_empty_is_root() {
        assert!(FieldPath::parse("").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_malformed() {
        let bad_inputs = [
            "a..b", "a.", ".a", "a[x]", "a[1", "a]b", "a[1]b", r#"a["x"#, r#"a["x"y]"#, r#"a["x\"]"#,
        ];
        for bad in bad_inputs {
            assert!(FieldPath::parse(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn display_roundtrip() {
        for text in ["budget.personnel", "goals[0]", "tables[1][2].cell", "a"] {
            let path = FieldPath::parse(text).unwrap();
            assert_eq!(path.to_string(), text);
        }
    }

    #[test]
    fn serializes_as_mixed_array() {
        let path = FieldPath::parse("budget.lines[2]").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"["budget","lines",2]"#);
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn humanize_labels() {
        let path = FieldPath::parse("strategic_goals[2].target-date").unwrap();
        assert_eq!(path.humanize(), "Strategic Goals › Item 3 › Target Date");
    }

    #[test]
    fn parent_and_prefix() {
        let path = FieldPath::parse("a.b[1]").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "a.b");
        assert!(path.starts_with(&parent));
        assert!(!parent.starts_with(&path));
        assert_eq!(FieldPath::root().parent(), None);
    }

    fn segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            any::<usize>().prop_map(PathSegment::Index),
            any::<String>().prop_map(PathSegment::Key),
            "[a-z_]{1,8}".prop_map(PathSegment::Key),
        ]
    }

    proptest! {
        #[test]
        fn display_parse_roundtrip(segments in prop::collection::vec(segment(), 0..6)) {
            let path = FieldPath::new(segments);
            prop_assert_eq!(FieldPath::parse(&path.to_string()).unwrap(), path);
        }
    }

    #[test]
    fn index_first_has_no_section() {
        let path = FieldPath::root().index(0);
        assert_eq!(path.section(), None);
    }
}
