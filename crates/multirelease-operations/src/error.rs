use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Git(#[from] multirelease_git::GitError),

    #[error(transparent)]
    Project(#[from] multirelease_project::ProjectError),

    #[error(transparent)]
    Manifest(#[from] multirelease_manifest::ManifestError),

    #[error("Cycle has been detected in local dependencies: {}", packages.join(", "))]
    DependencyCycle { packages: Vec<String> },

    #[error("Cannot release because dependency {dependency} has not been released")]
    DependencyNotReleased { dependency: String },

    #[error("package name '{name}' is declared by both '{first}' and '{second}'")]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid prerelease channel '{channel}'")]
    InvalidChannel {
        channel: String,
        #[source]
        source: semver::Error,
    },

    /// Failure raised by a pipeline engine or one of its plugins, passed through untouched.
    #[error(transparent)]
    Pipeline(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, OperationError>;

impl OperationError {
    /// Wraps an error coming from an external engine or plugin.
    pub fn pipeline(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Pipeline(error.into())
    }
}
