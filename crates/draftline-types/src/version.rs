use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::change::FieldChange;
use crate::error::TypeError;
use crate::identity::{DocumentId, VersionId};
use crate::value::SectionTree;

/// Which component of a [`VersionNumber`] a commit increments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    /// `1.2 -> 1.3`
    #[default]
    Minor,
    /// `1.2 -> 2.0`
    Major,
}

/// Semantic `major.minor` version number. The first version is `1.0`.
///
/// Ordering is by major, then minor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// `1.0`
    pub const fn initial() -> Self {
        Self::new(1, 0)
    }

    /// The next number for `bump`. Fails instead of wrapping when a
    /// component is already at its maximum.
    pub fn bump(self, bump: VersionBump) -> Result<Self, TypeError> {
        let next = match bump {
            VersionBump::Minor => self.minor.checked_add(1).map(|m| Self::new(self.major, m)),
            VersionBump::Major => self.major.checked_add(1).map(|m| Self::new(m, 0)),
        };
        next.ok_or_else(|| TypeError::VersionNumberOverflow(self.to_string()))
    }

    /// Parse `"1.2"` or `"v1.2"`.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let (major, minor) = body
            .split_once('.')
            .ok_or_else(|| TypeError::InvalidVersionNumber(s.to_string()))?;
        let major = major
            .parse()
            .map_err(|_| TypeError::InvalidVersionNumber(s.to_string()))?;
        let minor = minor
            .parse()
            .map_err(|_| TypeError::InvalidVersionNumber(s.to_string()))?;
        Ok(Self { major, minor })
    }
}

impl Default for VersionNumber {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Debug for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionNumber {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionNumber {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VersionNumber> for String {
    fn from(n: VersionNumber) -> Self {
        n.to_string()
    }
}

/// An immutable, committed snapshot of a document.
///
/// Versions are created only by the commit coordinator (or as the implicit
/// first version of a document) and are never mutated afterwards. Export
/// collaborators read the public fields verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub document_id: DocumentId,
    pub number: VersionNumber,
    /// `None` only for the first version of a document.
    pub parent_id: Option<VersionId>,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    /// Full content snapshot.
    pub sections: SectionTree,
    /// The changes that produced this version from its parent.
    pub changes: Vec<FieldChange>,
    /// BLAKE3 digest (hex) of `sections`.
    pub content_hash: String,
}

impl Version {
    /// Returns `true` for the first version of a document.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Recompute the content hash and compare with the stored one.
    pub fn verify_content_hash(&self) -> Result<bool, TypeError> {
        Ok(self.sections.content_hash()? == self.content_hash)
    }

    /// One-line description for logs: `v1.2 a1b2c3d4 "message"`.
    pub fn summary_line(&self) -> String {
        format!("v{} {} {:?}", self.number, self.id.short_id(), self.message)
    }
}

/// The inputs of a version before it is sealed with an id and content hash.
#[derive(Clone, Debug)]
pub struct NewVersion {
    pub document_id: DocumentId,
    pub number: VersionNumber,
    pub parent_id: Option<VersionId>,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub sections: SectionTree,
    pub changes: Vec<FieldChange>,
}

impl NewVersion {
    /// Assign a fresh id and compute the content hash.
    pub fn seal(self) -> Result<Version, TypeError> {
        let content_hash = self.sections.content_hash()?;
        Ok(Version {
            id: VersionId::new(),
            document_id: self.document_id,
            number: self.number,
            parent_id: self.parent_id,
            message: self.message,
            author: self.author,
            timestamp: self.timestamp,
            sections: self.sections,
            changes: self.changes,
            content_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initial_is_one_zero() {
        assert_eq!(VersionNumber::initial().to_string(), "1.0");
    }

    #[test]
    fn minor_bump_increments_minor() {
        let n = VersionNumber::new(1, 9).bump(VersionBump::Minor).unwrap();
        assert_eq!(n, VersionNumber::new(1, 10));
    }

    #[test]
    fn major_bump_resets_minor() {
        let n = VersionNumber::new(1, 4).bump(VersionBump::Major).unwrap();
        assert_eq!(n, VersionNumber::new(2, 0));
    }

    #[test]
    fn bump_at_maximum_is_an_error() {
        assert!(matches!(
            VersionNumber::new(1, u32::MAX).bump(VersionBump::Minor),
            Err(TypeError::VersionNumberOverflow(_))
        ));
        assert!(matches!(
            VersionNumber::new(u32::MAX, 3).bump(VersionBump::Major),
            Err(TypeError::VersionNumberOverflow(_))
        ));
        assert_eq!(
            VersionNumber::new(u32::MAX, 3).bump(VersionBump::Minor).unwrap(),
            VersionNumber::new(u32::MAX, 4)
        );
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        assert!(VersionNumber::new(1, 10) > VersionNumber::new(1, 9));
        assert!(VersionNumber::new(2, 0) > VersionNumber::new(1, 99));
    }

    #[test]
    fn parse_accepts_prefix() {
        assert_eq!(VersionNumber::parse("v1.2").unwrap(), VersionNumber::new(1, 2));
        assert_eq!(VersionNumber::parse(" 3.14 ").unwrap(), VersionNumber::new(3, 14));
        assert!(VersionNumber::parse("1").is_err());
        assert!(VersionNumber::parse("1.x").is_err());
        assert!(VersionNumber::parse("-1.0").is_err());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&VersionNumber::new(1, 1)).unwrap();
        assert_eq!(json, "\"1.1\"");
        let back: VersionNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, VersionNumber::new(1, 1));
    }

    #[test]
    fn sealed_version_hash_verifies() {
        let sections = SectionTree::from_json(json!({"budget": {"personnel": 100}})).unwrap();
        let version = NewVersion {
            document_id: DocumentId::new(),
            number: VersionNumber::initial(),
            parent_id: None,
            message: "Initial version".into(),
            author: "planner".into(),
            timestamp: Utc::now(),
            sections,
            changes: vec![],
        }
        .seal()
        .unwrap();

        assert!(version.is_root());
        assert!(version.verify_content_hash().unwrap());

        let mut tampered = version.clone();
        tampered
            .sections
            .insert_section("budget", json!({"personnel": 999}).into());
        assert!(!tampered.verify_content_hash().unwrap());
    }
}
