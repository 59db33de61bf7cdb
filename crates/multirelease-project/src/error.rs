use std::path::PathBuf;

use multirelease_manifest::ManifestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("{source_file}: workspaces must be a non-empty array of strings")]
    InvalidWorkspaces { source_file: PathBuf },

    #[error("package.json: project at '{root}' must contain one or more workspace packages")]
    NoPackages { root: PathBuf },

    #[error("invalid glob pattern '{pattern}'")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to read config at '{path}'")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at '{path}'")]
    ConfigJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config at '{path}'")]
    ConfigYaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}
