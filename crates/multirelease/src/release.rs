use std::path::Path;
use std::sync::Arc;

use clap::Args;
use multirelease_core::{BumpStrategy, ReleaseStrategy, Scheduling};
use multirelease_operations::operations::{
    MultiReleaseInput, MultiReleaseOperation, MultiReleaseOutput,
};
use multirelease_operations::pipeline::{StandardPipeline, StandardPlugins};
use multirelease_operations::providers::Git2Provider;
use multirelease_project::{DepsConfig, MultiReleaseConfig, ReleaseConfig, find_config};

use crate::error::Result;

#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {
    /// Output debugging information
    #[arg(long)]
    pub debug: bool,

    /// Compute next versions and notes without writing manifests or creating tags
    #[arg(long)]
    pub dry_run: bool,

    /// Only consider commits along the first-parent history of the release branch
    #[arg(long)]
    pub first_parent: bool,

    /// Initialize package pipelines one after another
    #[arg(long)]
    pub sequential_init: bool,

    /// How declared ranges of local dependencies are rewritten
    #[arg(long = "deps.bump", value_enum)]
    pub deps_bump: Option<BumpStrategy>,

    /// Release type of a package released only because of a dependency (patch, minor, major, inherit)
    #[arg(long = "deps.release")]
    pub deps_release: Option<ReleaseStrategy>,

    /// Prefix for versions written by the override strategy (^, ~ or empty)
    #[arg(long = "deps.prefix")]
    pub deps_prefix: Option<String>,

    /// Glob patterns of package directories to leave out
    #[arg(long, value_delimiter = ',')]
    pub ignore_packages: Vec<String>,

    /// Leave out packages marked private
    #[arg(long)]
    pub ignore_private: bool,

    /// How package pipelines are scheduled
    #[arg(long, value_enum, default_value_t = Scheduling::Concurrent)]
    pub strategy: Scheduling,
}

impl ReleaseArgs {
    /// Flags that were given, as a config layer over every config file.
    #[must_use]
    pub fn overrides(&self) -> ReleaseConfig {
        ReleaseConfig {
            branches: None,
            dry_run: self.dry_run.then_some(true),
            msr: MultiReleaseConfig {
                first_parent: self.first_parent.then_some(true),
                sequential_init: self.sequential_init.then_some(true),
                debug: self.debug.then_some(true),
                ignore_private: self.ignore_private.then_some(true),
                ignore_packages: (!self.ignore_packages.is_empty())
                    .then(|| self.ignore_packages.clone()),
                deps: DepsConfig {
                    bump: self.deps_bump,
                    release: self.deps_release,
                    prefix: self.deps_prefix.clone(),
                },
            },
        }
    }

    /// Whether debug output was asked for on the command line or in the root config.
    pub fn wants_debug(&self, cwd: &Path) -> bool {
        self.debug
            || find_config(cwd, Some(cwd))
                .ok()
                .flatten()
                .and_then(|(_, config)| config.msr.debug)
                .unwrap_or(false)
    }

    pub async fn execute(&self, cwd: &Path) -> Result<MultiReleaseOutput> {
        let git = Arc::new(Git2Provider::new());
        let operation = MultiReleaseOperation::new(
            Arc::clone(&git),
            Arc::new(StandardPipeline::new(Arc::clone(&git))),
            Arc::new(StandardPlugins::new(Arc::clone(&git))),
        );

        let output = operation
            .execute(MultiReleaseInput {
                cwd: cwd.to_path_buf(),
                overrides: self.overrides(),
                scheduling: self.strategy,
            })
            .await?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multirelease_core::ReleaseType;

    #[test]
    fn unset_flags_do_not_override_config() {
        let overrides = ReleaseArgs::default().overrides();

        assert_eq!(overrides, ReleaseConfig::default());
    }

    #[test]
    fn given_flags_become_overrides() {
        let args = ReleaseArgs {
            dry_run: true,
            sequential_init: true,
            deps_bump: Some(BumpStrategy::Satisfy),
            deps_release: Some(ReleaseStrategy::Fixed(ReleaseType::Minor)),
            deps_prefix: Some("^".to_string()),
            ignore_packages: vec!["packages/x/**".to_string()],
            ..ReleaseArgs::default()
        };

        let overrides = args.overrides();

        assert_eq!(overrides.dry_run, Some(true));
        assert_eq!(overrides.msr.sequential_init, Some(true));
        assert_eq!(overrides.msr.first_parent, None);
        assert_eq!(overrides.msr.deps.bump, Some(BumpStrategy::Satisfy));
        assert_eq!(
            overrides.msr.deps.release,
            Some(ReleaseStrategy::Fixed(ReleaseType::Minor))
        );
        assert_eq!(overrides.msr.deps.prefix.as_deref(), Some("^"));
        assert_eq!(
            overrides.msr.ignore_packages,
            Some(vec!["packages/x/**".to_string()])
        );
    }
}
