use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("package.json file not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("package.json is not a file: '{path}'")]
    NotAFile { path: PathBuf },

    #[error("failed to read manifest at '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write manifest at '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("package.json could not be parsed: '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize manifest for '{path}'")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("package.json was not an object: '{path}'")]
    NotAnObject { path: PathBuf },

    #[error("package name must be a non-empty string: '{path}'")]
    InvalidName { path: PathBuf },

    #[error("package {scope} must be an object: '{path}'")]
    InvalidScope { path: PathBuf, scope: String },
}

/// Broad category of a [`ManifestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestErrorKind {
    NotFound,
    Syntax,
    Type,
    Io,
}

impl ManifestError {
    #[must_use]
    pub fn kind(&self) -> ManifestErrorKind {
        match self {
            Self::NotFound { .. } | Self::NotAFile { .. } => ManifestErrorKind::NotFound,
            Self::Parse { .. } => ManifestErrorKind::Syntax,
            Self::NotAnObject { .. } | Self::InvalidName { .. } | Self::InvalidScope { .. } => {
                ManifestErrorKind::Type
            }
            Self::Read { .. } | Self::Write { .. } | Self::Serialize { .. } => ManifestErrorKind::Io,
        }
    }
}
