mod config;
mod error;
mod workspace;

pub use config::{
    CONFIG_FILES, DepsConfig, MultiReleaseConfig, ReleaseConfig, find_config, load_package_config,
};
pub use error::ProjectError;
pub use workspace::{WorkspaceTool, detect_workspace_patterns, list_package_manifest_paths};

pub type Result<T> = std::result::Result<T, ProjectError>;
