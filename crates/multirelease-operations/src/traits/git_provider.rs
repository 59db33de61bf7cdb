use std::path::Path;

use multirelease_core::Commit;
use multirelease_git::TagInfo;

use crate::Result;

pub trait GitProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened or HEAD is detached.
    fn current_branch(&self, project_root: &Path) -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened or has no commits.
    fn head_sha(&self, project_root: &Path) -> Result<String>;

    /// Commits in `since..until` that touch `dir`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is not below the repository root or a revision
    /// cannot be resolved.
    fn commits_for(
        &self,
        project_root: &Path,
        dir: &Path,
        since: Option<&str>,
        until: Option<&str>,
        first_parent_branch: Option<&str>,
    ) -> Result<Vec<Commit>>;

    /// # Errors
    ///
    /// Returns an error if `branch` cannot be resolved.
    fn tags_merged(&self, project_root: &Path, branch: &str) -> Result<Vec<String>>;

    /// # Errors
    ///
    /// Returns an error if the tag does not exist.
    fn commit_for_tag(&self, project_root: &Path, tag: &str) -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if the tag cannot be created or already exists.
    fn create_tag(&self, project_root: &Path, tag_name: &str, target: &str) -> Result<TagInfo>;
}
