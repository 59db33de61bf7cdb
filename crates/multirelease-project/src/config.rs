use std::path::{Path, PathBuf};

use multirelease_core::{BranchSpec, BumpStrategy, ReleaseStrategy};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ProjectError;

/// Files searched for release configuration, in priority order within one directory.
pub const CONFIG_FILES: [&str; 5] = [
    "package.json",
    ".releaserc",
    ".releaserc.json",
    ".releaserc.yaml",
    ".releaserc.yml",
];

const PACKAGE_CONFIG_KEY: &str = "release";

/// Release configuration as written in a config file. Every field is optional so
/// that configs from several levels can be layered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseConfig {
    #[serde(default, deserialize_with = "deserialize_branches")]
    pub branches: Option<Vec<BranchSpec>>,
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub msr: MultiReleaseConfig,
}

/// The `msr` table: options of the multi-package driver itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiReleaseConfig {
    pub first_parent: Option<bool>,
    pub sequential_init: Option<bool>,
    pub debug: Option<bool>,
    pub ignore_private: Option<bool>,
    pub ignore_packages: Option<Vec<String>>,
    #[serde(default)]
    pub deps: DepsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DepsConfig {
    pub bump: Option<BumpStrategy>,
    pub release: Option<ReleaseStrategy>,
    pub prefix: Option<String>,
}

impl ReleaseConfig {
    /// Layers `other` on top of `self`: values set in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            branches: other.branches.or(self.branches),
            dry_run: other.dry_run.or(self.dry_run),
            msr: self.msr.merge(other.msr),
        }
    }
}

impl MultiReleaseConfig {
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            first_parent: other.first_parent.or(self.first_parent),
            sequential_init: other.sequential_init.or(self.sequential_init),
            debug: other.debug.or(self.debug),
            ignore_private: other.ignore_private.or(self.ignore_private),
            ignore_packages: other.ignore_packages.or(self.ignore_packages),
            deps: DepsConfig {
                bump: other.deps.bump.or(self.deps.bump),
                release: other.deps.release.or(self.deps.release),
                prefix: other.deps.prefix.or(self.deps.prefix),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BranchEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        prerelease: Option<PrereleaseSetting>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PrereleaseSetting {
    Enabled(bool),
    Channel(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BranchList {
    One(BranchEntry),
    Many(Vec<BranchEntry>),
}

impl From<BranchEntry> for BranchSpec {
    fn from(entry: BranchEntry) -> Self {
        match entry {
            BranchEntry::Name(name) => BranchSpec::release(name),
            BranchEntry::Detailed { name, prerelease } => match prerelease {
                Some(PrereleaseSetting::Enabled(true)) => BranchSpec::prerelease(name.clone(), name),
                Some(PrereleaseSetting::Channel(channel)) => BranchSpec::prerelease(name, channel),
                Some(PrereleaseSetting::Enabled(false)) | None => BranchSpec::release(name),
            },
        }
    }
}

fn deserialize_branches<'de, D>(deserializer: D) -> Result<Option<Vec<BranchSpec>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let list = Option::<BranchList>::deserialize(deserializer)?;
    Ok(list.map(|list| match list {
        BranchList::One(entry) => vec![entry.into()],
        BranchList::Many(entries) => entries.into_iter().map(BranchSpec::from).collect(),
    }))
}

/// Searches `start` and its ancestors for release configuration, stopping after
/// `stop_at` when given. Returns the file the config came from along with it.
///
/// # Errors
///
/// Returns an error if a candidate file exists but cannot be read or parsed.
pub fn find_config(
    start: &Path,
    stop_at: Option<&Path>,
) -> Result<Option<(PathBuf, ReleaseConfig)>, ProjectError> {
    for dir in start.ancestors() {
        for file in CONFIG_FILES {
            let path = dir.join(file);
            if !path.is_file() {
                continue;
            }
            if let Some(config) = read_config(&path)? {
                debug!(config = %path.display(), "loaded release config");
                return Ok(Some((path, config)));
            }
        }
        if stop_at.is_some_and(|stop| dir == stop) {
            break;
        }
    }
    Ok(None)
}

/// Effective file config for a package: the workspace root config overlaid with
/// the nearest config between the package directory and the root.
///
/// # Errors
///
/// Returns an error if a config file cannot be read or parsed.
pub fn load_package_config(root: &Path, package_dir: &Path) -> Result<ReleaseConfig, ProjectError> {
    let root_config = find_config(root, Some(root))?.map(|(_, config)| config);
    let package_config = find_config(package_dir, Some(root))?.map(|(_, config)| config);

    Ok(root_config
        .unwrap_or_default()
        .merge(package_config.unwrap_or_default()))
}

fn read_config(path: &Path) -> Result<Option<ReleaseConfig>, ProjectError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ProjectError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();

    match file_name {
        "package.json" => {
            let manifest: Value =
                serde_json::from_str(&contents).map_err(|source| ProjectError::ConfigJson {
                    path: path.to_path_buf(),
                    source,
                })?;
            manifest
                .get(PACKAGE_CONFIG_KEY)
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|source| ProjectError::ConfigJson {
                    path: path.to_path_buf(),
                    source,
                })
        }
        ".releaserc.json" => serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| ProjectError::ConfigJson {
                path: path.to_path_buf(),
                source,
            }),
        _ => serde_yml::from_str(&contents)
            .map(Some)
            .map_err(|source| ProjectError::ConfigYaml {
                path: path.to_path_buf(),
                source,
            }),
    }
}
