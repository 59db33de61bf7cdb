use multirelease_core::{
    BranchSpec, BumpStrategy, LastRelease, NextRelease, PublishedRelease, ReleaseStrategy,
    Scheduling,
};
use multirelease_project::{MultiReleaseConfig, ReleaseConfig};

/// How dependents follow a released local dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepsOptions {
    pub bump: BumpStrategy,
    pub release: ReleaseStrategy,
    /// Prepended to a version that replaces a declared range outright (`^`, `~` or empty).
    pub prefix: String,
}

/// Options shared by every package of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub first_parent: bool,
    pub sequential_init: bool,
    pub ignore_private: bool,
    pub ignore_packages: Vec<String>,
    pub deps: DepsOptions,
    pub scheduling: Scheduling,
}

impl RunOptions {
    #[must_use]
    pub fn from_config(config: &MultiReleaseConfig, scheduling: Scheduling) -> Self {
        Self {
            first_parent: config.first_parent.unwrap_or(false),
            sequential_init: config.sequential_init.unwrap_or(false),
            ignore_private: config.ignore_private.unwrap_or(false),
            ignore_packages: config.ignore_packages.clone().unwrap_or_default(),
            deps: DepsOptions {
                bump: config.deps.bump.unwrap_or_default(),
                release: config.deps.release.unwrap_or_default(),
                prefix: config.deps.prefix.clone().unwrap_or_default(),
            },
            scheduling,
        }
    }
}

/// Options a single package releases with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    pub branches: Vec<BranchSpec>,
    pub dry_run: bool,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            branches: BranchSpec::defaults(),
            dry_run: false,
        }
    }
}

impl PackageOptions {
    #[must_use]
    pub fn from_config(config: &ReleaseConfig) -> Self {
        Self {
            branches: config.branches.clone().unwrap_or_else(BranchSpec::defaults),
            dry_run: config.dry_run.unwrap_or(false),
        }
    }

    /// The configured branch called `name`, if releases are cut from it.
    #[must_use]
    pub fn branch(&self, name: &str) -> Option<&BranchSpec> {
        self.branches.iter().find(|branch| branch.name == name)
    }
}

/// What the pipeline engine produced for a package that got a new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub last_release: Option<LastRelease>,
    pub next_release: NextRelease,
    pub releases: Vec<PublishedRelease>,
}

/// Final result of one package. Set once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    Released(ReleaseRecord),
    /// No relevant changes, or the branch is not a release branch for this package.
    Unchanged,
}

impl PackageOutcome {
    #[must_use]
    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released(_))
    }
}
