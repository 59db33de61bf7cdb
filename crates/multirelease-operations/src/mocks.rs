use std::fs;
use std::path::{Path, PathBuf};

use multirelease_core::Commit;
use multirelease_git::{GitError, TagInfo};
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::Result;
use crate::traits::GitProvider;

struct MockCommit {
    hash: String,
    message: String,
    paths: Vec<PathBuf>,
}

/// In-memory history of a single branch. Commits are stored oldest first and
/// touch the listed paths, relative to the repository root.
pub struct MockGitProvider {
    branch: String,
    commits: Mutex<Vec<MockCommit>>,
    tags: Mutex<Vec<TagInfo>>,
    tags_created: Mutex<Vec<TagInfo>>,
}

impl MockGitProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            branch: "main".to_string(),
            commits: Mutex::new(Vec::new()),
            tags: Mutex::new(Vec::new()),
            tags_created: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    #[must_use]
    pub fn with_commit(self, path: &str, message: &str) -> Self {
        self.commit(path, message);
        self
    }

    /// Appends a commit touching `path` and returns its hash.
    pub fn commit(&self, path: &str, message: &str) -> String {
        let mut commits = self.commits.lock();
        let hash = format!("{:07x}{}", commits.len() + 1, "f".repeat(33));
        commits.push(MockCommit {
            hash: hash.clone(),
            message: message.to_string(),
            paths: vec![PathBuf::from(path)],
        });
        hash
    }

    #[must_use]
    pub fn tags_created(&self) -> Vec<String> {
        self.tags_created.lock().iter().map(|tag| tag.name.clone()).collect()
    }

    fn position(commits: &[MockCommit], hash: &str) -> Result<usize> {
        commits
            .iter()
            .position(|commit| commit.hash == hash)
            .ok_or_else(|| {
                GitError::RefNotFound {
                    refspec: hash.to_string(),
                }
                .into()
            })
    }
}

impl Default for MockGitProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GitProvider for MockGitProvider {
    fn current_branch(&self, _project_root: &Path) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn head_sha(&self, _project_root: &Path) -> Result<String> {
        self.commits
            .lock()
            .last()
            .map(|commit| commit.hash.clone())
            .ok_or_else(|| {
                GitError::RefNotFound {
                    refspec: "HEAD".to_string(),
                }
                .into()
            })
    }

    fn commits_for(
        &self,
        project_root: &Path,
        dir: &Path,
        since: Option<&str>,
        until: Option<&str>,
        _first_parent_branch: Option<&str>,
    ) -> Result<Vec<Commit>> {
        let relative = dir.strip_prefix(project_root).unwrap_or(dir);
        let commits = self.commits.lock();
        let start = match since {
            Some(hash) => Self::position(&commits, hash)? + 1,
            None => 0,
        };
        let end = match until {
            Some(hash) => Self::position(&commits, hash)? + 1,
            None => commits.len(),
        };

        Ok(commits[start..end.max(start)]
            .iter()
            .rev()
            .filter(|commit| commit.paths.iter().any(|path| path.starts_with(relative)))
            .map(|commit| Commit::new(commit.hash.clone(), commit.message.clone()))
            .collect())
    }

    fn tags_merged(&self, _project_root: &Path, _branch: &str) -> Result<Vec<String>> {
        Ok(self.tags.lock().iter().map(|tag| tag.name.clone()).collect())
    }

    fn commit_for_tag(&self, _project_root: &Path, tag: &str) -> Result<String> {
        self.tags
            .lock()
            .iter()
            .find(|info| info.name == tag)
            .map(|info| info.target_sha.clone())
            .ok_or_else(|| {
                GitError::RefNotFound {
                    refspec: tag.to_string(),
                }
                .into()
            })
    }

    fn create_tag(&self, _project_root: &Path, tag_name: &str, target: &str) -> Result<TagInfo> {
        let info = TagInfo {
            name: tag_name.to_string(),
            target_sha: target.to_string(),
        };
        self.tags.lock().push(info.clone());
        self.tags_created.lock().push(info.clone());
        Ok(info)
    }
}

/// A workspace on disk with a private root manifest listing `packages/*`.
pub struct MockWorkspace {
    dir: TempDir,
}

impl MockWorkspace {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created or written.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::write(
            dir.path().join("package.json"),
            "{\n  \"name\": \"msr-test-root\",\n  \"private\": true,\n  \"workspaces\": [\"packages/*\"]\n}\n",
        )
        .expect("failed to write root manifest");
        Self { dir }
    }

    /// Adds `packages/<dir>/package.json` with the given extra top-level fields.
    ///
    /// # Panics
    ///
    /// Panics if the manifest cannot be written.
    #[must_use]
    pub fn with_package(self, dir: &str, name: &str, fields: &str) -> Self {
        let package_dir = self.dir.path().join("packages").join(dir);
        fs::create_dir_all(&package_dir).expect("failed to create package dir");
        fs::write(
            package_dir.join("package.json"),
            format!("{{\n  \"name\": \"{name}\",\n  \"version\": \"0.0.0\"{fields}\n}}\n"),
        )
        .expect("failed to write package manifest");
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// # Panics
    ///
    /// Panics if the manifest cannot be read.
    #[must_use]
    pub fn manifest(&self, dir: &str) -> String {
        fs::read_to_string(self.root().join("packages").join(dir).join("package.json"))
            .expect("failed to read package manifest")
    }
}

impl Default for MockWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
