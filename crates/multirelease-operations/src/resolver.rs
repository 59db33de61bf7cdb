use multirelease_core::{DependencyScope, ReleaseStrategy, ReleaseType};
use multirelease_manifest::Manifest;
use multirelease_version::{
    next_pre_version, next_version, resolve_next_version, strip_workspace_protocol,
};
use semver::Version;
use tracing::debug;

use crate::arena::{PackageArena, PackageId};
use crate::error::OperationError;
use crate::types::DepsOptions;
use crate::Result;

/// Copy of the inputs the cascade reads for one package.
///
/// Resolution works on a full set of snapshots so that exploring a dependency
/// never writes to another package's state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub name: String,
    pub local_deps: Vec<PackageId>,
    pub manifest: Manifest,
    pub last_version: Option<Version>,
    pub next_type: Option<ReleaseType>,
    /// Version already computed by the package's own pipeline.
    pub next_version: Option<Version>,
    pub release_versions: Vec<Version>,
    pub deps_changed: Vec<PackageId>,
}

/// Resolves the release type of `id`, taking bumps of its local dependencies into account.
///
/// An analyzed `next_type` always wins. Otherwise the package releases when a
/// dependency with a release type needs a new declared range, or when the
/// package itself was never released. `ignore` holds the packages already on
/// the path, which keeps cyclic graphs finite.
///
/// Declared ranges of every visited snapshot are rewritten in place, so a second
/// call over the same snapshots finds nothing left to bump.
///
/// # Errors
///
/// Returns `OperationError::InvalidChannel` if `channel` is not a valid prerelease identifier.
pub fn resolve_release_type(
    snapshots: &mut [Snapshot],
    id: PackageId,
    deps: &DepsOptions,
    channel: Option<&str>,
    ignore: &[PackageId],
) -> Result<Option<ReleaseType>> {
    let dependent_type = dependent_release(snapshots, id, deps, channel, ignore)?;

    if let Some(analyzed) = snapshots[id].next_type {
        return Ok(Some(analyzed));
    }
    let Some(dependent_type) = dependent_type else {
        return Ok(None);
    };

    let release_type = match deps.release {
        ReleaseStrategy::Fixed(release_type) => release_type,
        ReleaseStrategy::Inherit => dependent_type,
    };
    snapshots[id].next_type = Some(release_type);
    Ok(Some(release_type))
}

/// Most severe release type among the dependencies that force `id` to release.
fn dependent_release(
    snapshots: &mut [Snapshot],
    id: PackageId,
    deps: &DepsOptions,
    channel: Option<&str>,
    ignore: &[PackageId],
) -> Result<Option<ReleaseType>> {
    let local_deps = snapshots[id].local_deps.clone();
    let never_released = snapshots[id].last_version.is_none();
    let nested_ignore: Vec<PackageId> = ignore.iter().chain(&local_deps).copied().collect();

    let mut highest = None;
    let mut deps_changed = Vec::new();
    for dep in local_deps.into_iter().filter(|dep| !ignore.contains(dep)) {
        let dep_type = resolve_release_type(snapshots, dep, deps, channel, &nested_ignore)?;
        let version = dependency_version(&snapshots[dep], dep_type, channel)?;
        let name = snapshots[dep].name.clone();

        let bumped = version
            .as_ref()
            .is_some_and(|version| bump_dependency(&mut snapshots[id].manifest, &name, version, deps));
        if bumped || never_released {
            deps_changed.push(dep);
            highest = highest.max(dep_type);
        }
    }

    snapshots[id].deps_changed = deps_changed;
    Ok(highest)
}

/// Version a dependency is expected to have at the end of the run.
fn dependency_version(
    dependency: &Snapshot,
    release_type: Option<ReleaseType>,
    channel: Option<&str>,
) -> Result<Option<Version>> {
    if dependency.next_version.is_some() {
        return Ok(dependency.next_version.clone());
    }
    let Some(release_type) = release_type else {
        return Ok(dependency.last_version.clone());
    };

    let last = dependency.last_version.as_ref();
    match channel {
        Some(channel) => next_pre_version(last, Some(release_type), channel, &dependency.release_versions)
            .map(Some)
            .map_err(|source| OperationError::InvalidChannel {
                channel: channel.to_string(),
                source,
            }),
        None => Ok(Some(next_version(last, Some(release_type)))),
    }
}

/// Rewrites every declared range of `name` in `manifest`. Returns whether any of
/// them needed a new value.
///
/// A `workspace:` range whose resolved value only drops the protocol is left alone.
pub(crate) fn bump_dependency(
    manifest: &mut Manifest,
    name: &str,
    version: &Version,
    deps: &DepsOptions,
) -> bool {
    let mut bumped = false;
    for scope in DependencyScope::ALL {
        let Some(current) = manifest.dependency(scope, name) else {
            continue;
        };
        let resolved = resolve_next_version(current, version, deps.bump, &deps.prefix);
        if resolved != strip_workspace_protocol(current) {
            bumped |= manifest.set_dependency(scope, name, &resolved);
        }
    }
    bumped
}

/// Runs the cascade for one package of the arena and records the outcome on it.
pub struct CascadeResolver<'a> {
    arena: &'a PackageArena,
    deps: &'a DepsOptions,
}

impl<'a> CascadeResolver<'a> {
    #[must_use]
    pub fn new(arena: &'a PackageArena, deps: &'a DepsOptions) -> Self {
        Self { arena, deps }
    }

    /// Resolves the release type of `id` and stores it together with the
    /// rewritten manifest. The stored type never decreases.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidChannel` for an invalid prerelease channel.
    pub fn resolve(&self, id: PackageId) -> Result<Option<ReleaseType>> {
        let channel = self.arena.state(id).prerelease.clone();
        let mut snapshots = self.snapshots();

        let release_type =
            resolve_release_type(&mut snapshots, id, self.deps, channel.as_deref(), &[])?;
        let owner = snapshots.swap_remove(id);

        let mut state = self.arena.state_mut(id);
        state.next_type = state.next_type.max(release_type);
        state.manifest = owner.manifest;

        debug!(
            package = %owner.name,
            release_type = ?state.next_type,
            deps_changed = owner.deps_changed.len(),
            "resolved release type"
        );
        Ok(state.next_type)
    }

    fn snapshots(&self) -> Vec<Snapshot> {
        self.arena
            .packages()
            .iter()
            .map(|package| {
                let state = self.arena.state(package.id);
                Snapshot {
                    name: package.name.clone(),
                    local_deps: package.local_deps.clone(),
                    manifest: state.manifest.clone(),
                    last_version: state.last_release.as_ref().map(|release| release.version.clone()),
                    next_type: state.next_type,
                    next_version: state.next_release.as_ref().map(|release| release.version.clone()),
                    release_versions: state.release_versions.clone(),
                    deps_changed: Vec::new(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::tests::{arena, manifest};
    use multirelease_core::{BumpStrategy, LastRelease};

    fn snapshot(
        name: &str,
        deps_json: &str,
        local_deps: &[PackageId],
        last: Option<&str>,
        next_type: Option<ReleaseType>,
    ) -> Snapshot {
        let body = if deps_json.is_empty() {
            String::new()
        } else {
            format!(",\n  \"dependencies\": {deps_json}")
        };
        Snapshot {
            name: name.to_string(),
            local_deps: local_deps.to_vec(),
            manifest: manifest(name, &body),
            last_version: last.map(|v| Version::parse(v).unwrap_or_else(|e| panic!("{v}: {e}"))),
            next_type,
            next_version: None,
            release_versions: Vec::new(),
            deps_changed: Vec::new(),
        }
    }

    fn options(release: ReleaseStrategy) -> DepsOptions {
        DepsOptions {
            release,
            ..DepsOptions::default()
        }
    }

    fn resolve(snapshots: &mut [Snapshot], release: ReleaseStrategy) -> Option<ReleaseType> {
        match resolve_release_type(snapshots, 0, &options(release), None, &[]) {
            Ok(release_type) => release_type,
            Err(err) => panic!("resolution failed: {err}"),
        }
    }

    const PATCH: ReleaseStrategy = ReleaseStrategy::Fixed(ReleaseType::Patch);

    #[test]
    fn package_without_deps_keeps_analyzed_type() {
        let mut snapshots = [snapshot("a", "", &[], None, None)];
        assert_eq!(resolve(&mut snapshots, PATCH), None);

        let mut snapshots = [snapshot("a", "", &[], Some("1.0.0"), Some(ReleaseType::Patch))];
        assert_eq!(resolve(&mut snapshots, PATCH), Some(ReleaseType::Patch));
        assert!(snapshots[0].deps_changed.is_empty());
    }

    #[test]
    fn unreleased_package_counts_every_dependency_as_changed() {
        let mut snapshots = [
            snapshot("pkg", r#"{ "a": "*", "b": "*" }"#, &[1, 2], None, None),
            snapshot("a", "", &[], None, None),
            snapshot("b", "", &[], None, None),
        ];

        assert_eq!(resolve(&mut snapshots, PATCH), None);
        assert_eq!(snapshots[0].deps_changed, [1, 2]);
    }

    #[test]
    fn dependency_bump_releases_the_dependent() {
        let mut snapshots = [
            snapshot("pkg", r#"{ "a": "1.0.0" }"#, &[1, 2], Some("1.0.0"), None),
            snapshot("a", "", &[], Some("1.0.0"), Some(ReleaseType::Patch)),
            snapshot("b", "", &[], Some("1.0.0"), None),
        ];

        assert_eq!(resolve(&mut snapshots, PATCH), Some(ReleaseType::Patch));
        assert_eq!(snapshots[0].deps_changed, [1]);
        assert_eq!(
            snapshots[0].manifest.dependency(DependencyScope::Dependencies, "a"),
            Some("1.0.1")
        );
    }

    #[test]
    fn unchanged_dependencies_release_nothing() {
        let mut snapshots = [
            snapshot("pkg", r#"{ "a": "1.0.0" }"#, &[1, 2], Some("1.0.0"), None),
            snapshot("a", "", &[], Some("1.0.0"), None),
            snapshot("b", "", &[], Some("1.0.0"), None),
        ];

        assert_eq!(resolve(&mut snapshots, PATCH), None);
        assert!(snapshots[0].deps_changed.is_empty());
    }

    fn chain(c: Option<ReleaseType>, d: Option<ReleaseType>) -> [Snapshot; 5] {
        [
            snapshot("pkg", r#"{ "a": "1.0.0" }"#, &[1], Some("1.0.0"), None),
            snapshot(
                "a",
                r#"{ "b": "1.0.0", "c": "1.0.0", "d": "1.0.0" }"#,
                &[2, 3, 4],
                Some("1.0.0"),
                None,
            ),
            snapshot("b", "", &[], Some("1.0.0"), None),
            snapshot("c", "", &[], Some("1.0.0"), c),
            snapshot("d", "", &[], Some("1.0.0"), d),
        ]
    }

    #[test]
    fn inherit_takes_the_most_severe_bump_down_the_chain() {
        let mut snapshots = chain(Some(ReleaseType::Patch), Some(ReleaseType::Major));

        assert_eq!(
            resolve(&mut snapshots, ReleaseStrategy::Inherit),
            Some(ReleaseType::Major)
        );
        assert_eq!(snapshots[1].next_type, Some(ReleaseType::Major));
        assert_eq!(snapshots[1].deps_changed, [3, 4]);
        assert_eq!(snapshots[0].deps_changed, [1]);
        assert_eq!(
            snapshots[0].manifest.dependency(DependencyScope::Dependencies, "a"),
            Some("2.0.0")
        );
    }

    #[test]
    fn fixed_strategy_overrides_the_dependency_type() {
        let mut snapshots = chain(Some(ReleaseType::Patch), Some(ReleaseType::Minor));

        let major = ReleaseStrategy::Fixed(ReleaseType::Major);
        assert_eq!(resolve(&mut snapshots, major), Some(ReleaseType::Major));
        assert_eq!(snapshots[1].next_type, Some(ReleaseType::Major));
        assert_eq!(snapshots[3].next_type, Some(ReleaseType::Patch));
    }

    #[test]
    fn default_strategy_releases_dependents_as_patch() {
        let mut snapshots = chain(Some(ReleaseType::Minor), Some(ReleaseType::Major));

        assert_eq!(resolve(&mut snapshots, PATCH), Some(ReleaseType::Patch));
        assert_eq!(snapshots[1].next_type, Some(ReleaseType::Patch));
    }

    #[test]
    fn resolving_twice_changes_nothing_the_second_time() {
        let mut snapshots = chain(None, Some(ReleaseType::Major));

        let first = resolve(&mut snapshots, ReleaseStrategy::Inherit);
        let manifests: Vec<String> = snapshots
            .iter()
            .map(|s| s.manifest.render().unwrap_or_default())
            .collect();
        let second = resolve(&mut snapshots, ReleaseStrategy::Inherit);

        assert_eq!(first, second);
        let after: Vec<String> = snapshots
            .iter()
            .map(|s| s.manifest.render().unwrap_or_default())
            .collect();
        assert_eq!(manifests, after);
    }

    #[test]
    fn self_reference_terminates_with_the_analyzed_type() {
        let strategies = [
            PATCH,
            ReleaseStrategy::Fixed(ReleaseType::Major),
            ReleaseStrategy::Inherit,
        ];
        for strategy in strategies {
            let mut snapshots = [snapshot(
                "a",
                r#"{ "a": "1.0.0" }"#,
                &[0],
                Some("1.0.0"),
                Some(ReleaseType::Minor),
            )];

            assert_eq!(resolve(&mut snapshots, strategy), Some(ReleaseType::Minor));
        }
    }

    #[test]
    fn indirect_cycle_terminates() {
        let mut snapshots = [
            snapshot("a", r#"{ "b": "1.0.0" }"#, &[1], Some("1.0.0"), None),
            snapshot("b", r#"{ "a": "1.0.0" }"#, &[0], Some("1.0.0"), Some(ReleaseType::Minor)),
        ];

        assert_eq!(resolve(&mut snapshots, PATCH), Some(ReleaseType::Patch));
        assert_eq!(snapshots[0].deps_changed, [1]);

        let b = resolve_release_type(&mut snapshots, 1, &options(PATCH), None, &[]);
        assert!(matches!(b, Ok(Some(ReleaseType::Minor))));
    }

    #[test]
    fn new_packages_in_a_cycle_stay_unreleased() {
        let mut snapshots = [
            snapshot("pkg", r#"{ "a": "*", "b": "*" }"#, &[1, 2], None, None),
            snapshot("a", r#"{ "a": "*" }"#, &[1], None, None),
            snapshot("b", "", &[], None, None),
        ];

        assert_eq!(resolve(&mut snapshots, PATCH), None);
    }

    #[test]
    fn ignore_strategy_never_triggers_a_release() {
        let mut snapshots = [
            snapshot("pkg", r#"{ "a": "workspace:1.0.0" }"#, &[1], Some("1.0.0"), None),
            snapshot("a", "", &[], Some("1.0.0"), Some(ReleaseType::Major)),
        ];
        let deps = DepsOptions {
            bump: BumpStrategy::Ignore,
            ..DepsOptions::default()
        };

        let result = resolve_release_type(&mut snapshots, 0, &deps, None, &[]);

        assert!(matches!(result, Ok(None)));
        assert_eq!(
            snapshots[0].manifest.dependency(DependencyScope::Dependencies, "a"),
            Some("workspace:1.0.0")
        );
    }

    #[test]
    fn workspace_star_materializes_the_next_version() {
        let mut snapshots = [
            snapshot("pkg", r#"{ "a": "workspace:*" }"#, &[1], Some("1.0.0"), None),
            snapshot("a", "", &[], Some("1.0.0"), Some(ReleaseType::Minor)),
        ];

        assert_eq!(resolve(&mut snapshots, PATCH), Some(ReleaseType::Patch));
        assert_eq!(
            snapshots[0].manifest.dependency(DependencyScope::Dependencies, "a"),
            Some("1.1.0")
        );
    }

    #[test]
    fn prerelease_channel_of_the_dependent_picks_the_dependency_version() -> anyhow::Result<()> {
        let mut snapshots = [
            snapshot("pkg", r#"{ "a": "1.0.0" }"#, &[1], Some("1.0.0"), None),
            snapshot("a", "", &[], Some("1.0.0"), Some(ReleaseType::Patch)),
        ];

        let result = resolve_release_type(&mut snapshots, 0, &options(PATCH), Some("beta"), &[])?;

        assert_eq!(result, Some(ReleaseType::Patch));
        assert_eq!(
            snapshots[0].manifest.dependency(DependencyScope::Dependencies, "a"),
            Some("1.0.1-beta.1")
        );
        Ok(())
    }

    #[test]
    fn cascade_resolver_persists_owner_state_only() -> anyhow::Result<()> {
        let arena = arena(vec![
            manifest("a", r#", "dependencies": { "b": "1.0.0" }"#),
            manifest("b", r#", "dependencies": { "c": "1.0.0" }"#),
            manifest("c", ""),
        ]);
        for id in 0..3 {
            arena.state_mut(id).last_release = Some(LastRelease {
                version: Version::new(1, 0, 0),
                git_tag: format!("{}@1.0.0", arena.package(id).name),
                git_head: "abc".to_string(),
            });
        }
        arena.state_mut(2).next_type = Some(ReleaseType::Minor);
        let deps = DepsOptions::default();
        let resolver = CascadeResolver::new(&arena, &deps);

        assert_eq!(resolver.resolve(0)?, Some(ReleaseType::Patch));
        assert_eq!(arena.state(1).next_type, None);
        assert_eq!(
            arena.state(1).manifest.dependency(DependencyScope::Dependencies, "c"),
            Some("1.0.0")
        );
        assert_eq!(
            arena.state(0).manifest.dependency(DependencyScope::Dependencies, "b"),
            Some("1.0.1")
        );

        assert_eq!(resolver.resolve(0)?, Some(ReleaseType::Patch));
        assert_eq!(
            arena.state(0).manifest.dependency(DependencyScope::Dependencies, "b"),
            Some("1.0.1")
        );
        Ok(())
    }
}
