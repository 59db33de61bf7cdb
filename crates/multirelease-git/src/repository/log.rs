use std::path::Path;

use multirelease_core::Commit;
use tracing::debug;

use crate::Result;

use super::Repository;

impl Repository {
    /// Commits in `since..until` (`until` defaults to HEAD) that touch `dir`, newest first.
    ///
    /// With `first_parent_branch`, only the first-parent chain of that branch is walked.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::OutsideRepository`](crate::GitError::OutsideRepository) or
    /// [`GitError::RepositoryRoot`](crate::GitError::RepositoryRoot) for an invalid
    /// `dir`, and [`GitError::RefNotFound`](crate::GitError::RefNotFound) if a
    /// revision cannot be resolved.
    pub fn commits_for(
        &self,
        dir: &Path,
        since: Option<&str>,
        until: Option<&str>,
        first_parent_branch: Option<&str>,
    ) -> Result<Vec<Commit>> {
        let relative = self.package_relative_path(dir)?;

        let mut walk = self.inner.revwalk()?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        walk.push(self.resolve_commit(until.unwrap_or("HEAD"))?.id())?;
        if let Some(branch) = first_parent_branch {
            walk.push(self.resolve_commit(branch)?.id())?;
            walk.simplify_first_parent()?;
        }
        if let Some(since) = since {
            walk.hide(self.resolve_commit(since)?.id())?;
        }

        let mut commits = Vec::new();
        for oid in walk {
            let commit = self.inner.find_commit(oid?)?;
            if self.touches(&commit, &relative, first_parent_branch.is_some())? {
                commits.push(Commit::new(
                    commit.id().to_string(),
                    commit.message().unwrap_or_default().trim(),
                ));
            }
        }

        debug!(
            dir = %relative.display(),
            since = since.unwrap_or(""),
            until = until.unwrap_or("HEAD"),
            count = commits.len(),
            "filtered commits"
        );
        Ok(commits)
    }

    /// A commit touches `path` when it differs there from every parent it is compared with.
    fn touches(&self, commit: &git2::Commit<'_>, path: &Path, first_parent_only: bool) -> Result<bool> {
        let tree = commit.tree()?;
        let mut options = git2::DiffOptions::new();
        options.pathspec(path);

        if commit.parent_count() == 0 {
            let diff = self
                .inner
                .diff_tree_to_tree(None, Some(&tree), Some(&mut options))?;
            return Ok(diff.deltas().len() > 0);
        }

        let parents = if first_parent_only { 1 } else { commit.parent_count() };
        for parent in commit.parents().take(parents) {
            let diff = self
                .inner
                .diff_tree_to_tree(Some(&parent.tree()?), Some(&tree), Some(&mut options))?;
            if diff.deltas().len() == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
