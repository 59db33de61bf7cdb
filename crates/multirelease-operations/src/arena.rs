use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexSet;
use multirelease_core::{LastRelease, NextRelease, ReleaseType};
use multirelease_manifest::Manifest;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use semver::Version;

use crate::error::OperationError;
use crate::graph::cycle_groups;
use crate::types::{PackageOptions, PackageOutcome};
use crate::Result;

/// Stable index of a package within one run.
pub type PackageId = usize;

/// Milestones a package pipeline reports to the other pipelines of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    Ready,
    Analyzed,
    /// Cascade resolution finished; `next_type` is final.
    Resolved,
    NextRelease,
    Tagged,
    DepsUpdated,
    Prepared,
    Published,
}

/// The immutable description of a package under release.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    pub manifest_path: PathBuf,
    pub dir: PathBuf,
    /// Packages of this run that this one depends on. May contain the package itself.
    pub local_deps: Vec<PackageId>,
    /// Packages depending on each other, directly or not, share a cycle group.
    pub cycle_group: usize,
    pub options: PackageOptions,
}

/// Resolution state of a package, filled in as its pipeline advances.
#[derive(Debug)]
pub struct PackageState {
    pub manifest: Manifest,
    pub last_release: Option<LastRelease>,
    pub next_type: Option<ReleaseType>,
    pub next_release: Option<NextRelease>,
    pub prerelease: Option<String>,
    /// Versions already tagged for this package on the release branch.
    pub release_versions: Vec<Version>,
    probes: HashSet<Probe>,
    started: bool,
    outcome: Option<PackageOutcome>,
}

impl PackageState {
    fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            last_release: None,
            next_type: None,
            next_release: None,
            prerelease: None,
            release_versions: Vec::new(),
            probes: HashSet::new(),
            started: false,
            outcome: None,
        }
    }

    #[must_use]
    pub fn has(&self, probe: Probe) -> bool {
        self.probes.contains(&probe)
    }

    /// Started and still without an outcome.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.started && self.outcome.is_none()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&PackageOutcome> {
        self.outcome.as_ref()
    }

    pub(crate) fn set(&mut self, probe: Probe) -> bool {
        self.probes.insert(probe)
    }

    pub(crate) fn start(&mut self) {
        self.started = true;
    }

    /// Records the outcome unless one was already recorded.
    pub(crate) fn finish(&mut self, outcome: PackageOutcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }
}

/// All packages of a run, addressed by [`PackageId`].
///
/// Descriptors never change after construction. Each state sits behind its own
/// lock; guards must be dropped before awaiting.
#[derive(Debug)]
pub struct PackageArena {
    packages: Vec<Package>,
    states: Vec<RwLock<PackageState>>,
}

impl PackageArena {
    /// Builds the arena and links every package to the local packages it declares.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::DuplicatePackage` if two manifests share a name.
    pub fn new(entries: Vec<(Manifest, PackageOptions)>) -> Result<Self> {
        let mut names: IndexSet<String> = IndexSet::new();
        for (manifest, _) in &entries {
            let (index, inserted) = names.insert_full(manifest.name().to_string());
            if !inserted {
                return Err(OperationError::DuplicatePackage {
                    name: manifest.name().to_string(),
                    first: entries[index].0.path().to_path_buf(),
                    second: manifest.path().to_path_buf(),
                });
            }
        }

        let local_deps: Vec<Vec<PackageId>> = entries
            .iter()
            .map(|(manifest, _)| {
                manifest
                    .declared_dependency_names()
                    .iter()
                    .filter_map(|name| names.get_index_of(name))
                    .collect()
            })
            .collect();
        let groups = cycle_groups(&local_deps);

        let mut packages = Vec::with_capacity(entries.len());
        let mut states = Vec::with_capacity(entries.len());
        let descriptors = entries.into_iter().zip(local_deps);
        for (id, ((manifest, options), local_deps)) in descriptors.enumerate() {
            packages.push(Package {
                id,
                name: manifest.name().to_string(),
                manifest_path: manifest.path().to_path_buf(),
                dir: manifest.dir().to_path_buf(),
                local_deps,
                cycle_group: groups[id],
                options,
            });
            states.push(RwLock::new(PackageState::new(manifest)));
        }

        Ok(Self { packages, states })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    #[must_use]
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id]
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<PackageId> {
        self.packages.iter().position(|package| package.name == name)
    }

    pub fn state(&self, id: PackageId) -> RwLockReadGuard<'_, PackageState> {
        self.states[id].read()
    }

    pub(crate) fn state_mut(&self, id: PackageId) -> RwLockWriteGuard<'_, PackageState> {
        self.states[id].write()
    }
}
