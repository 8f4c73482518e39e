use draftline_types::VersionBump;
use serde::{Deserialize, Serialize};

/// What the caller supplies when sealing a working copy into a version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub message: String,
    pub author: String,
    #[serde(default)]
    pub bump: VersionBump,
}

impl CommitRequest {
    /// A minor-bump commit.
    pub fn new(message: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            author: author.into(),
            bump: VersionBump::Minor,
        }
    }

    /// Choose which version component the commit increments.
    pub fn with_bump(mut self, bump: VersionBump) -> Self {
        self.bump = bump;
        self
    }

    /// Shorthand for `with_bump(VersionBump::Major)`.
    pub fn major(self) -> Self {
        self.with_bump(VersionBump::Major)
    }
}
