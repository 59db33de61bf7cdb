use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use multirelease_manifest::read_manifest;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ProjectError;

const MANIFEST_FILE: &str = "package.json";
const PNPM_WORKSPACE_FILE: &str = "pnpm-workspace.yaml";
const LERNA_FILE: &str = "lerna.json";
const SKIPPED_DIRS: [&str; 1] = ["node_modules"];

/// Where the workspace package globs were declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceTool {
    /// `workspaces` in the root `package.json` (npm, yarn, bun).
    PackageJson,
    Pnpm,
    Lerna,
}

#[derive(Debug, Deserialize)]
struct PatternList {
    #[serde(default)]
    packages: Option<Vec<String>>,
}

/// Reads the package globs of the workspace rooted at `root`.
///
/// Returns `None` for a plain single-package repository.
///
/// # Errors
///
/// Returns an error if the root `package.json` is missing or invalid, or if a
/// workspace declaration is malformed.
pub fn detect_workspace_patterns(
    root: &Path,
) -> Result<Option<(WorkspaceTool, Vec<String>)>, ProjectError> {
    let manifest_path = root.join(MANIFEST_FILE);
    let manifest = read_manifest(&manifest_path)?;

    if let Some(workspaces) = manifest.field("workspaces") {
        let patterns = match workspaces {
            Value::Object(table) => table.get("packages"),
            other => Some(other),
        }
        .and_then(string_list)
        .filter(|patterns| !patterns.is_empty())
        .ok_or(ProjectError::InvalidWorkspaces {
            source_file: manifest_path,
        })?;
        return Ok(Some((WorkspaceTool::PackageJson, patterns)));
    }

    let pnpm_path = root.join(PNPM_WORKSPACE_FILE);
    if pnpm_path.is_file() {
        let contents = read_config_file(&pnpm_path)?;
        let list: PatternList =
            serde_yml::from_str(&contents).map_err(|source| ProjectError::ConfigYaml {
                path: pnpm_path.clone(),
                source,
            })?;
        let patterns = list
            .packages
            .filter(|patterns| !patterns.is_empty())
            .ok_or(ProjectError::InvalidWorkspaces {
                source_file: pnpm_path,
            })?;
        return Ok(Some((WorkspaceTool::Pnpm, patterns)));
    }

    let lerna_path = root.join(LERNA_FILE);
    if lerna_path.is_file() {
        let contents = read_config_file(&lerna_path)?;
        let list: PatternList =
            serde_json::from_str(&contents).map_err(|source| ProjectError::ConfigJson {
                path: lerna_path,
                source,
            })?;
        let patterns = list
            .packages
            .unwrap_or_else(|| vec!["packages/*".to_string()]);
        return Ok(Some((WorkspaceTool::Lerna, patterns)));
    }

    Ok(None)
}

/// Lists the absolute `package.json` paths of every workspace package under `cwd`.
///
/// Patterns starting with `!` and every entry of `ignore` exclude matching packages.
///
/// # Errors
///
/// Returns `ProjectError::NoPackages` if nothing matches, and the errors of
/// [`detect_workspace_patterns`] otherwise.
pub fn list_package_manifest_paths(
    cwd: &Path,
    ignore: &[String],
) -> Result<Vec<PathBuf>, ProjectError> {
    let patterns = match detect_workspace_patterns(cwd)? {
        Some((tool, patterns)) => {
            debug!(?tool, ?patterns, "detected workspace");
            patterns
        }
        None => Vec::new(),
    };

    let mut includes = Vec::new();
    let mut excludes: Vec<&str> = ignore.iter().map(String::as_str).collect();
    for pattern in &patterns {
        match pattern.strip_prefix('!') {
            Some(negated) => excludes.push(negated),
            None => includes.push(pattern.as_str()),
        }
    }

    let include_set = build_manifest_globset(&includes)?;
    let exclude_set = build_manifest_globset(&excludes)?;

    let mut manifests = Vec::new();
    if !includes.is_empty() {
        collect_manifests(cwd, cwd, &include_set, &exclude_set, &mut manifests)?;
    }
    manifests.sort();

    if manifests.is_empty() {
        return Err(ProjectError::NoPackages {
            root: cwd.to_path_buf(),
        });
    }

    Ok(manifests)
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn read_config_file(path: &Path) -> Result<String, ProjectError> {
    std::fs::read_to_string(path).map_err(|source| ProjectError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Turns directory globs into globs over the `package.json` inside those directories.
fn build_manifest_globset(patterns: &[&str]) -> Result<GlobSet, ProjectError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let dir = pattern.trim_start_matches("./").trim_end_matches('/');
        let manifest_pattern = if dir.is_empty() {
            MANIFEST_FILE.to_string()
        } else {
            format!("{dir}/{MANIFEST_FILE}")
        };
        let glob = GlobBuilder::new(&manifest_pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| ProjectError::GlobPattern {
                pattern: (*pattern).to_string(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ProjectError::GlobPattern {
        pattern: patterns.join(","),
        source,
    })
}

fn collect_manifests(
    base: &Path,
    current: &Path,
    includes: &GlobSet,
    excludes: &GlobSet,
    results: &mut Vec<PathBuf>,
) -> Result<(), ProjectError> {
    for entry in std::fs::read_dir(current)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let hidden_or_skipped = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.') || SKIPPED_DIRS.contains(&name));
        if hidden_or_skipped {
            continue;
        }

        let manifest = path.join(MANIFEST_FILE);
        if manifest.is_file() {
            let relative = manifest.strip_prefix(base).unwrap_or(&manifest);
            if includes.is_match(relative) && !excludes.is_match(relative) {
                results.push(manifest.clone());
            }
        }

        collect_manifests(base, &path, includes, excludes, results)?;
    }

    Ok(())
}
