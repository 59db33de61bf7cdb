use multirelease_manifest::write_manifest;
use semver::Version;
use tracing::debug;

use crate::arena::{PackageArena, PackageId};
use crate::error::OperationError;
use crate::resolver::bump_dependency;
use crate::types::DepsOptions;
use crate::Result;

/// Brings the declared ranges of a package's local dependencies in line with
/// their released versions and writes the manifest.
pub struct ManifestUpdater<'a> {
    arena: &'a PackageArena,
    deps: &'a DepsOptions,
}

impl<'a> ManifestUpdater<'a> {
    #[must_use]
    pub fn new(arena: &'a PackageArena, deps: &'a DepsOptions) -> Self {
        Self { arena, deps }
    }

    /// Returns whether the manifest file changed.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::DependencyNotReleased` if a local dependency has
    /// neither a next nor a last release, and `OperationError::Manifest` if the
    /// file cannot be written.
    pub fn update(&self, id: PackageId) -> Result<bool> {
        let package = self.arena.package(id);

        let mut versions: Vec<(&str, Version)> = Vec::with_capacity(package.local_deps.len());
        for &dep in &package.local_deps {
            let name = self.arena.package(dep).name.as_str();
            let state = self.arena.state(dep);
            let version = state
                .next_release
                .as_ref()
                .map(|release| release.version.clone())
                .or_else(|| state.last_release.as_ref().map(|release| release.version.clone()))
                .ok_or_else(|| OperationError::DependencyNotReleased {
                    dependency: name.to_string(),
                })?;
            versions.push((name, version));
        }

        let mut state = self.arena.state_mut(id);
        for (name, version) in &versions {
            bump_dependency(&mut state.manifest, name, version, self.deps);
        }
        let written = write_manifest(&mut state.manifest)?;

        debug!(package = %package.name, written, "updated manifest dependencies");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageOptions;
    use multirelease_core::{LastRelease, NextRelease, ReleaseType};
    use multirelease_manifest::read_manifest;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_package(root: &Path, name: &str, contents: &str) -> anyhow::Result<()> {
        let dir = root.join(name);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("package.json"), contents)?;
        Ok(())
    }

    fn load(root: &Path, names: &[&str]) -> anyhow::Result<PackageArena> {
        let mut entries = Vec::new();
        for name in names {
            let manifest = read_manifest(&root.join(name).join("package.json"))?;
            entries.push((manifest, PackageOptions::default()));
        }
        Ok(PackageArena::new(entries)?)
    }

    fn released(version: Version, tag: String) -> NextRelease {
        NextRelease {
            release_type: ReleaseType::Minor,
            version,
            git_tag: tag,
            git_head: "abc".to_string(),
            channel: None,
            notes: None,
        }
    }

    const TABBED: &str =
        "{\n\t\"name\": \"app\",\n\t\"version\": \"0.0.0\",\n\t\"dependencies\": {\n\t\t\"lib\": \"*\"\n\t}\n}\n";

    #[test]
    fn writes_released_version_preserving_format() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write_package(dir.path(), "app", TABBED)?;
        write_package(dir.path(), "lib", "{ \"name\": \"lib\", \"version\": \"0.0.0\" }")?;
        let arena = load(dir.path(), &["app", "lib"])?;
        arena.state_mut(1).next_release = Some(released(Version::new(1, 1, 0), "lib@1.1.0".into()));
        let deps = DepsOptions::default();
        let updater = ManifestUpdater::new(&arena, &deps);

        assert!(updater.update(0)?);
        let written = fs::read_to_string(dir.path().join("app/package.json"))?;
        assert_eq!(written, TABBED.replace("\"*\"", "\"1.1.0\""));

        assert!(!updater.update(0)?);
        assert_eq!(fs::read_to_string(dir.path().join("app/package.json"))?, written);
        Ok(())
    }

    #[test]
    fn falls_back_to_last_release() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write_package(
            dir.path(),
            "app",
            "{\n  \"name\": \"app\",\n  \"peerDependencies\": {\n    \"lib\": \"^1.0.0\"\n  }\n}",
        )?;
        write_package(dir.path(), "lib", r#"{ "name": "lib" }"#)?;
        let arena = load(dir.path(), &["app", "lib"])?;
        arena.state_mut(1).last_release = Some(LastRelease {
            version: Version::new(1, 2, 0),
            git_tag: "lib@1.2.0".to_string(),
            git_head: "abc".to_string(),
        });
        let deps = DepsOptions {
            bump: multirelease_core::BumpStrategy::Satisfy,
            ..DepsOptions::default()
        };

        assert!(!ManifestUpdater::new(&arena, &deps).update(0)?);
        Ok(())
    }

    #[test]
    fn unreleased_dependency_is_fatal() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write_package(
            dir.path(),
            "app",
            r#"{ "name": "app", "dependencies": { "lib": "*" } }"#,
        )?;
        write_package(dir.path(), "lib", r#"{ "name": "lib" }"#)?;
        let arena = load(dir.path(), &["app", "lib"])?;
        let deps = DepsOptions::default();

        let result = ManifestUpdater::new(&arena, &deps).update(0);

        assert!(matches!(
            result,
            Err(OperationError::DependencyNotReleased { dependency }) if dependency == "lib"
        ));
        assert_eq!(
            fs::read_to_string(dir.path().join("app/package.json"))?,
            r#"{ "name": "app", "dependencies": { "lib": "*" } }"#
        );
        Ok(())
    }

    #[test]
    fn self_dependency_uses_own_next_release() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write_package(
            dir.path(),
            "lib",
            "{\n  \"name\": \"lib\",\n  \"peerDependencies\": {\n    \"lib\": \"1.0.0\"\n  }\n}",
        )?;
        let arena = load(dir.path(), &["lib"])?;
        arena.state_mut(0).next_release = Some(released(Version::new(1, 1, 0), "lib@1.1.0".into()));
        let deps = DepsOptions::default();

        assert!(ManifestUpdater::new(&arena, &deps).update(0)?);
        assert!(fs::read_to_string(dir.path().join("lib/package.json"))?.contains("\"lib\": \"1.1.0\""));
        Ok(())
    }
}
