use semver::Version;
use serde::{Deserialize, Serialize};

use crate::ReleaseType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub message: String,
}

impl Commit {
    #[must_use]
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
        }
    }

    /// First line of the commit message.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }
}

/// The most recent release of a package reachable from the release branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRelease {
    pub version: Version,
    pub git_tag: String,
    pub git_head: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextRelease {
    pub release_type: ReleaseType,
    pub version: Version,
    pub git_tag: String,
    pub git_head: String,
    pub channel: Option<String>,
    pub notes: Option<String>,
}

/// A branch releases are cut from. `prerelease` names the channel for prerelease branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSpec {
    pub name: String,
    pub prerelease: Option<String>,
}

impl BranchSpec {
    #[must_use]
    pub fn release(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prerelease: None,
        }
    }

    #[must_use]
    pub fn prerelease(name: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prerelease: Some(channel.into()),
        }
    }

    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::release("master"),
            Self::release("main"),
            Self::release("next"),
            Self::release("next-major"),
            Self::prerelease("beta", "beta"),
            Self::prerelease("alpha", "alpha"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRelease {
    pub name: String,
    pub version: Version,
    pub git_tag: String,
    pub channel: Option<String>,
}
