use std::path::PathBuf;

use async_trait::async_trait;
use multirelease_core::{
    BranchSpec, Commit, LastRelease, NextRelease, PublishedRelease, ReleaseType,
};
use semver::Version;

use crate::types::{PackageOptions, ReleaseRecord};
use crate::Result;

/// The evolving state of one package release, handed to every lifecycle hook.
#[derive(Debug, Clone)]
pub struct ReleaseContext {
    /// Repository root the run was started from.
    pub cwd: PathBuf,
    pub package_name: String,
    pub package_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub branch: BranchSpec,
    pub options: PackageOptions,
    pub commits: Vec<Commit>,
    pub last_release: Option<LastRelease>,
    pub next_release: Option<NextRelease>,
    /// Versions of this package already tagged on the branch.
    pub release_versions: Vec<Version>,
}

impl ReleaseContext {
    /// Tag naming a release of this package: `<name>@<version>`.
    #[must_use]
    pub fn tag_for(&self, version: &Version) -> String {
        format!("{}@{version}", self.package_name)
    }
}

/// Callbacks a pipeline engine invokes at fixed points of a package release.
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the release must not go ahead.
    async fn verify_conditions(&self, context: &mut ReleaseContext) -> Result<()>;

    /// Returns the release type the commits call for, `None` for no release.
    ///
    /// # Errors
    ///
    /// Returns an error if commits cannot be read or classified.
    async fn analyze_commits(&self, context: &mut ReleaseContext) -> Result<Option<ReleaseType>>;

    /// # Errors
    ///
    /// Returns an error if the notes cannot be produced.
    async fn generate_notes(&self, context: &mut ReleaseContext) -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if files for the release cannot be written.
    async fn prepare(&self, context: &mut ReleaseContext) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if publishing fails.
    async fn publish(&self, context: &mut ReleaseContext) -> Result<Option<PublishedRelease>>;
}

/// Drives one package through verify, analyze, notes, prepare and publish.
#[async_trait]
pub trait PipelineEngine: Send + Sync {
    /// Returns the release that was made, or `None` when there was nothing to release.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the engine or a hook.
    async fn run(
        &self,
        context: ReleaseContext,
        hooks: &dyn LifecycleHooks,
    ) -> Result<Option<ReleaseRecord>>;
}
