mod log;
mod status;
mod tag;

use std::path::{Path, PathBuf};

use crate::{GitError, Result};

pub struct Repository {
    pub(crate) inner: git2::Repository,
    root: PathBuf,
}

impl Repository {
    /// # Errors
    ///
    /// Returns [`GitError::NotARepository`] if the path is not inside a git repository.
    pub fn open(path: &Path) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|_| GitError::NotARepository {
            path: path.to_path_buf(),
        })?;

        let root = inner.workdir().ok_or_else(|| GitError::NotARepository {
            path: path.to_path_buf(),
        })?;

        // Use dunce to get a path without the \\?\ prefix on Windows
        let root = dunce::canonicalize(root).unwrap_or_else(|_| dunce::simplified(root).to_path_buf());

        Ok(Self { inner, root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `dir` relative to the repository root. `dir` must be a proper
    /// subdirectory of the working tree.
    pub(crate) fn package_relative_path(&self, dir: &Path) -> Result<PathBuf> {
        let absolute = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.root.join(dir)
        };
        let normalized = dunce::canonicalize(&absolute).unwrap_or(absolute);

        let relative = normalized
            .strip_prefix(&self.root)
            .map_err(|_| GitError::OutsideRepository {
                dir: dir.to_path_buf(),
            })?;

        if relative.as_os_str().is_empty() {
            return Err(GitError::RepositoryRoot {
                dir: dir.to_path_buf(),
            });
        }

        Ok(relative.to_path_buf())
    }

    fn resolve_commit(&self, refspec: &str) -> Result<git2::Commit<'_>> {
        self.inner
            .revparse_single(refspec)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|_| GitError::RefNotFound {
                refspec: refspec.to_string(),
            })
    }
}
