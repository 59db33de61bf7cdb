use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git operation failed")]
    Git(#[from] git2::Error),

    #[error("not a git repository: '{path}'")]
    NotARepository { path: PathBuf },

    #[error("failed to resolve reference '{refspec}'")]
    RefNotFound { refspec: String },

    #[error("HEAD is detached, not on a branch")]
    DetachedHead,

    #[error("package directory '{dir}' must be inside the repository")]
    OutsideRepository { dir: PathBuf },

    #[error("package directory '{dir}' must not be the repository root")]
    RepositoryRoot { dir: PathBuf },
}
