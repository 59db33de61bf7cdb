use std::path::Path;

use multirelease_core::Commit;
use multirelease_git::{Repository, TagInfo};

use crate::Result;
use crate::traits::GitProvider;

pub struct Git2Provider;

impl Git2Provider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Git2Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl GitProvider for Git2Provider {
    fn current_branch(&self, project_root: &Path) -> Result<String> {
        let repo = Repository::open(project_root)?;
        Ok(repo.current_branch()?)
    }

    fn head_sha(&self, project_root: &Path) -> Result<String> {
        let repo = Repository::open(project_root)?;
        Ok(repo.head_sha()?)
    }

    fn commits_for(
        &self,
        project_root: &Path,
        dir: &Path,
        since: Option<&str>,
        until: Option<&str>,
        first_parent_branch: Option<&str>,
    ) -> Result<Vec<Commit>> {
        let repo = Repository::open(project_root)?;
        Ok(repo.commits_for(dir, since, until, first_parent_branch)?)
    }

    fn tags_merged(&self, project_root: &Path, branch: &str) -> Result<Vec<String>> {
        let repo = Repository::open(project_root)?;
        Ok(repo.tags_merged(branch)?)
    }

    fn commit_for_tag(&self, project_root: &Path, tag: &str) -> Result<String> {
        let repo = Repository::open(project_root)?;
        Ok(repo.commit_for_tag(tag)?)
    }

    fn create_tag(&self, project_root: &Path, tag_name: &str, target: &str) -> Result<TagInfo> {
        let repo = Repository::open(project_root)?;
        Ok(repo.create_tag(tag_name, target)?)
    }
}
