use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Severity of a release. Ordered so that `max` picks the most severe bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Patch,
    Minor,
    Major,
}

impl ReleaseType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            other => Err(ParseError::ReleaseType(other.to_string())),
        }
    }
}

/// How a dependent's declared range is rewritten when a local dependency gets a new version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BumpStrategy {
    /// Replace the range with the new version.
    #[default]
    Override,
    /// Keep the range if it already accepts the new version.
    Satisfy,
    /// Keep the range if it accepts the new version, otherwise carry its shape over.
    Inherit,
    /// Never touch the declared range.
    Ignore,
}

impl fmt::Display for BumpStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Override => "override",
            Self::Satisfy => "satisfy",
            Self::Inherit => "inherit",
            Self::Ignore => "ignore",
        };
        f.write_str(s)
    }
}

impl FromStr for BumpStrategy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "override" => Ok(Self::Override),
            "satisfy" => Ok(Self::Satisfy),
            "inherit" => Ok(Self::Inherit),
            "ignore" => Ok(Self::Ignore),
            other => Err(ParseError::BumpStrategy(other.to_string())),
        }
    }
}

/// Release type given to a package whose only reason to release is a dependency bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReleaseStrategy {
    Fixed(ReleaseType),
    /// Use the most severe release type among the dependencies that triggered the release.
    Inherit,
}

impl Default for ReleaseStrategy {
    fn default() -> Self {
        Self::Fixed(ReleaseType::Patch)
    }
}

impl fmt::Display for ReleaseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(release_type) => release_type.fmt(f),
            Self::Inherit => f.write_str("inherit"),
        }
    }
}

impl FromStr for ReleaseStrategy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "inherit" {
            return Ok(Self::Inherit);
        }
        s.parse::<ReleaseType>()
            .map(Self::Fixed)
            .map_err(|_| ParseError::ReleaseStrategy(s.to_string()))
    }
}

impl TryFrom<String> for ReleaseStrategy {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReleaseStrategy> for String {
    fn from(value: ReleaseStrategy) -> Self {
        value.to_string()
    }
}

/// Top-level driver used to run the per-package pipelines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scheduling {
    /// Every pipeline starts at once; cross-package ordering is enforced by barriers.
    #[default]
    Concurrent,
    /// Topological batches of the dependency graph, one batch after the other.
    Batched,
}

impl FromStr for Scheduling {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concurrent" => Ok(Self::Concurrent),
            "batched" => Ok(Self::Batched),
            other => Err(ParseError::Scheduling(other.to_string())),
        }
    }
}

/// The four dependency tables of a `package.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyScope {
    Dependencies,
    DevDependencies,
    PeerDependencies,
    OptionalDependencies,
}

impl DependencyScope {
    pub const ALL: [Self; 4] = [
        Self::Dependencies,
        Self::DevDependencies,
        Self::PeerDependencies,
        Self::OptionalDependencies,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::PeerDependencies => "peerDependencies",
            Self::OptionalDependencies => "optionalDependencies",
        }
    }
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
