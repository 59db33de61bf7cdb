use crate::{GitError, Result, TagInfo};

use super::Repository;

impl Repository {
    /// Tags whose commit is reachable from `branch`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::RefNotFound`] if `branch` cannot be resolved.
    pub fn tags_merged(&self, branch: &str) -> Result<Vec<String>> {
        let branch_head = self.resolve_commit(branch)?.id();
        let names = self.inner.tag_names(None)?;

        let mut merged = Vec::new();
        for name in names.iter().flatten() {
            let Ok(target) = self.resolve_commit(&format!("refs/tags/{name}")) else {
                continue;
            };
            let target = target.id();
            if target == branch_head || self.inner.graph_descendant_of(branch_head, target)? {
                merged.push(name.to_string());
            }
        }

        Ok(merged)
    }

    /// SHA of the commit a tag points at.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::RefNotFound`] if the tag does not exist.
    pub fn commit_for_tag(&self, tag: &str) -> Result<String> {
        self.resolve_commit(&format!("refs/tags/{tag}"))
            .map(|commit| commit.id().to_string())
            .map_err(|_| GitError::RefNotFound {
                refspec: tag.to_string(),
            })
    }

    /// Creates a lightweight tag on `target` (a revision, usually a commit SHA).
    ///
    /// # Errors
    ///
    /// Returns an error if `target` cannot be resolved or the tag already exists.
    pub fn create_tag(&self, name: &str, target: &str) -> Result<TagInfo> {
        let commit = self.resolve_commit(target)?;
        self.inner.tag_lightweight(name, commit.as_object(), false)?;

        Ok(TagInfo {
            name: name.to_string(),
            target_sha: commit.id().to_string(),
        })
    }
}
