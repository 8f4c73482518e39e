use std::collections::BTreeMap;
use std::path::Path;

use draftline_diff::{HighlightOptions, LabelMap};
use draftline_types::VersionBump;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Engine settings, usually read from `draftline.toml`.
///
/// Every field has a default, so a partial file is valid:
/// ```toml
/// default_author = "planning-office"
/// default_bump = "minor"
///
/// [labels]
/// "budget.personnel" = "Personnel Costs"
/// "goals.items[].target_date" = "Target Date"
///
/// [highlight]
/// max_value_len = 60
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Author recorded when a caller does not name one.
    pub default_author: String,
    /// Bump applied by commits that do not request one.
    pub default_bump: VersionBump,
    /// Run the history validator whenever a document is loaded.
    pub validate_on_load: bool,
    /// Field labels keyed by dotted path; `[]` matches any list index.
    pub labels: BTreeMap<String, String>,
    pub highlight: HighlightOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_author: "anonymous".into(),
            default_bump: VersionBump::Minor,
            validate_on_load: true,
            labels: BTreeMap::new(),
            highlight: HighlightOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Parse TOML; missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Render every field, including defaults, as TOML.
    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Read and parse a TOML file. A missing file is an error.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Like [`load`](Self::load), falling back to defaults when the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> SdkResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// The configured labels as a [`LabelMap`].
    pub fn label_map(&self) -> LabelMap {
        self.labels
            .iter()
            .map(|(path, label)| (path.clone(), label.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftline_diff::LabelResolver;
    use draftline_types::FieldPath;

    #[test]
    fn default_config() {
        let c = EngineConfig::default();
        assert_eq!(c.default_author, "anonymous");
        assert_eq!(c.default_bump, VersionBump::Minor);
        assert_eq!(c.highlight.max_value_len, 80);
        assert!(c.validate_on_load);
        assert!(c.labels.is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = EngineConfig::from_toml_str(
            r#"
            default_author = "planning-office"

            [labels]
            "budget.personnel" = "Personnel Costs"
            "#,
        )
        .unwrap();
        assert_eq!(c.default_author, "planning-office");
        assert_eq!(c.highlight, HighlightOptions::default());
        assert_eq!(
            c.label_map().label(&FieldPath::parse("budget.personnel").unwrap()),
            "Personnel Costs"
        );
    }

    #[test]
    fn major_bump_and_highlight_options() {
        let c = EngineConfig::from_toml_str(
            "default_bump = \"major\"\nvalidate_on_load = false\n[highlight]\nmax_value_len = 12\n",
        )
        .unwrap();
        assert_eq!(c.default_bump, VersionBump::Major);
        assert!(!c.validate_on_load);
        assert_eq!(c.highlight.max_value_len, 12);
    }

    #[test]
    fn toml_roundtrip() {
        let mut c = EngineConfig::default();
        c.labels.insert("goals.items[].title".into(), "Goal".into());
        let text = c.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("default_bump = \"sideways\""),
            Err(SdkError::Config(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = EngineConfig::load_or_default(&dir.path().join("draftline.toml")).unwrap();
        assert_eq!(c, EngineConfig::default());
    }
}
