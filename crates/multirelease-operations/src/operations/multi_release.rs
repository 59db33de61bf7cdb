use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::try_join_all;
use multirelease_core::Scheduling;
use multirelease_manifest::read_manifest;
use multirelease_project::{
    ReleaseConfig, find_config, list_package_manifest_paths, load_package_config,
};
use tracing::{Instrument, debug, info, info_span};

use crate::arena::{PackageArena, PackageId};
use crate::graph::{batched_topological_order, build_graph};
use crate::plugin::InlinePluginCreator;
use crate::synchronizer::{Gate, Synchronizer};
use crate::traits::{GitProvider, LifecycleHooks, PipelineEngine, ReleaseContext};
use crate::types::{PackageOptions, PackageOutcome, RunOptions};
use crate::Result;

pub struct MultiReleaseInput {
    /// Workspace root holding the root `package.json`.
    pub cwd: PathBuf,
    /// Values given on the command line. They win over every config file.
    pub overrides: ReleaseConfig,
    pub scheduling: Scheduling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub name: String,
    pub outcome: PackageOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiReleaseOutput {
    pub packages: Vec<PackageReport>,
}

impl MultiReleaseOutput {
    #[must_use]
    pub fn released(&self) -> usize {
        self.packages
            .iter()
            .filter(|report| report.outcome.is_released())
            .count()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn report(&self, name: &str) -> Option<&PackageReport> {
        self.packages.iter().find(|report| report.name == name)
    }
}

/// Everything a package pipeline needs that is shared across the run.
struct Run {
    cwd: PathBuf,
    branch: String,
    options: Arc<RunOptions>,
    sync: Arc<Synchronizer>,
    creator: InlinePluginCreator,
}

/// Releases every package of a workspace, keeping dependents in step with the
/// local packages they depend on.
pub struct MultiReleaseOperation<G, E> {
    git: Arc<G>,
    engine: Arc<E>,
    plugins: Arc<dyn LifecycleHooks>,
}

impl<G, E> MultiReleaseOperation<G, E>
where
    G: GitProvider + 'static,
    E: PipelineEngine,
{
    pub fn new(git: Arc<G>, engine: Arc<E>, plugins: Arc<dyn LifecycleHooks>) -> Self {
        Self {
            git,
            engine,
            plugins,
        }
    }

    /// # Errors
    ///
    /// Returns an error if configuration or a manifest cannot be read, if
    /// batched scheduling meets a dependency cycle, or if any package release fails.
    pub async fn execute(&self, input: MultiReleaseInput) -> Result<MultiReleaseOutput> {
        let MultiReleaseInput {
            cwd,
            overrides,
            scheduling,
        } = input;

        let root_config = find_config(&cwd, Some(&cwd))?
            .map(|(_, config)| config)
            .unwrap_or_default()
            .merge(overrides.clone());
        let options = Arc::new(RunOptions::from_config(&root_config.msr, scheduling));
        debug!(?options, "run options");

        let arena = Arc::new(load_packages(&cwd, &overrides, &options)?);
        let batches = match options.scheduling {
            Scheduling::Batched => batches(&arena)?,
            Scheduling::Concurrent => vec![(0..arena.len()).collect()],
        };
        info!("Queued {} packages! Starting release...", arena.len());

        let branch = self.git.current_branch(&cwd)?;
        let sync = Arc::new(Synchronizer::new(Arc::clone(&arena)));
        let creator = InlinePluginCreator::new(
            Arc::clone(&sync),
            Arc::clone(&self.git) as Arc<dyn GitProvider>,
            Arc::clone(&self.plugins),
            Arc::clone(&options),
        );
        let run = Run {
            cwd,
            branch,
            options,
            sync,
            creator,
        };

        for batch in batches {
            for &id in &batch {
                run.sync.start(id);
            }
            if run.options.sequential_init {
                if let Some(&first) = batch.first() {
                    run.sync.first_claim(Gate::ReadyForRelease, first);
                }
            }
            try_join_all(batch.into_iter().map(|id| {
                let span = info_span!("package", name = %arena.package(id).name);
                self.release_package(&run, id).instrument(span)
            }))
            .await?;
        }

        let packages = arena
            .packages()
            .iter()
            .map(|package| PackageReport {
                name: package.name.clone(),
                outcome: arena
                    .state(package.id)
                    .outcome()
                    .cloned()
                    .unwrap_or(PackageOutcome::Unchanged),
            })
            .collect();
        let output = MultiReleaseOutput { packages };
        info!(
            "Released {} of {} packages, semantically!",
            output.released(),
            output.total()
        );
        Ok(output)
    }

    async fn release_package(&self, run: &Run, id: PackageId) -> Result<()> {
        let package = run.sync.arena().package(id);
        let plugin = run.creator.create(id);

        if run.options.sequential_init {
            run.sync.wait_for(Gate::ReadyForRelease, id).await;
        }

        let outcome = match package.options.branch(&run.branch) {
            Some(branch) => {
                let context = ReleaseContext {
                    cwd: run.cwd.clone(),
                    package_name: package.name.clone(),
                    package_dir: package.dir.clone(),
                    manifest_path: package.manifest_path.clone(),
                    branch: branch.clone(),
                    options: package.options.clone(),
                    commits: Vec::new(),
                    last_release: None,
                    next_release: None,
                    release_versions: Vec::new(),
                };
                match self.engine.run(context, &plugin).await? {
                    Some(record) => PackageOutcome::Released(record),
                    None => PackageOutcome::Unchanged,
                }
            }
            None => {
                info!(
                    "Branch {} is not configured to publish releases of {}",
                    run.branch, package.name
                );
                PackageOutcome::Unchanged
            }
        };

        run.sync.finish(id, outcome);
        plugin.settle();
        Ok(())
    }
}

fn load_packages(
    cwd: &Path,
    overrides: &ReleaseConfig,
    options: &RunOptions,
) -> Result<PackageArena> {
    let paths = list_package_manifest_paths(cwd, &options.ignore_packages)?;
    info!("Started multirelease! Loading {} packages...", paths.len());

    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        let manifest = read_manifest(&path)?;
        if options.ignore_private && manifest.is_private() {
            debug!(package = manifest.name(), "skipping private package");
            continue;
        }
        let config = load_package_config(cwd, manifest.dir())?.merge(overrides.clone());
        info!("Loaded package {}", manifest.name());
        entries.push((manifest, PackageOptions::from_config(&config)));
    }

    PackageArena::new(entries)
}

/// Package ids grouped so that every batch only depends on earlier ones.
fn batches(arena: &PackageArena) -> Result<Vec<Vec<PackageId>>> {
    let order = batched_topological_order(&build_graph(arena))?;
    Ok(order
        .iter()
        .map(|batch| batch.iter().filter_map(|name| arena.find(name)).collect())
        .collect())
}
