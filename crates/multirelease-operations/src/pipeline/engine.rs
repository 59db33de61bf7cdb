use std::sync::Arc;

use async_trait::async_trait;
use multirelease_core::{LastRelease, NextRelease, ReleaseType};
use multirelease_version::{next_pre_version, next_version, prerelease_channel, version_from_tag};
use semver::Version;
use tracing::{info, warn};

use crate::error::OperationError;
use crate::traits::{GitProvider, LifecycleHooks, PipelineEngine, ReleaseContext};
use crate::types::ReleaseRecord;
use crate::Result;

/// Runs the release steps of one package against a git repository.
pub struct StandardPipeline<G: GitProvider> {
    git: Arc<G>,
}

impl<G: GitProvider> StandardPipeline<G> {
    #[must_use]
    pub fn new(git: Arc<G>) -> Self {
        Self { git }
    }

    /// Versions of the package tagged as `<name>@<version>` on the current branch.
    fn release_versions(&self, context: &ReleaseContext) -> Result<Vec<(Version, String)>> {
        let prefix = format!("{}@", context.package_name);
        let tags = self.git.tags_merged(&context.cwd, &context.branch.name)?;

        let mut versions: Vec<_> = tags
            .into_iter()
            .filter(|tag| tag.starts_with(&prefix))
            .filter_map(|tag| {
                let version = version_from_tag(Some(&context.package_name), &tag)?;
                Some((version, tag))
            })
            .collect();
        versions.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(versions)
    }

    fn last_release(
        &self,
        context: &ReleaseContext,
        versions: &[(Version, String)],
    ) -> Result<Option<LastRelease>> {
        let channel = context.branch.prerelease.as_deref();
        let Some((version, tag)) = versions.iter().rev().find(|(version, _)| {
            prerelease_channel(version).is_none_or(|current| Some(current) == channel)
        }) else {
            info!("No git tag version found on branch {}", context.branch.name);
            return Ok(None);
        };

        let git_head = self.git.commit_for_tag(&context.cwd, tag)?;
        info!(
            "Found git tag {tag} associated with version {version} on branch {}",
            context.branch.name
        );
        Ok(Some(LastRelease {
            version: version.clone(),
            git_tag: tag.clone(),
            git_head,
        }))
    }

    fn next_version(context: &ReleaseContext, release_type: ReleaseType) -> Result<Version> {
        let last = context.last_release.as_ref().map(|release| &release.version);
        match context.branch.prerelease.as_deref() {
            Some(channel) => {
                next_pre_version(last, Some(release_type), channel, &context.release_versions)
                    .map_err(|source| OperationError::InvalidChannel {
                        channel: channel.to_string(),
                        source,
                    })
            }
            None => Ok(next_version(last, Some(release_type))),
        }
    }
}

#[async_trait]
impl<G: GitProvider + 'static> PipelineEngine for StandardPipeline<G> {
    async fn run(
        &self,
        mut context: ReleaseContext,
        hooks: &dyn LifecycleHooks,
    ) -> Result<Option<ReleaseRecord>> {
        hooks.verify_conditions(&mut context).await?;

        let versions = self.release_versions(&context)?;
        context.last_release = self.last_release(&context, &versions)?;
        context.release_versions = versions.into_iter().map(|(version, _)| version).collect();

        let Some(release_type) = hooks.analyze_commits(&mut context).await? else {
            info!("There are no relevant changes, so no new version is released.");
            return Ok(None);
        };

        let git_head = self.git.head_sha(&context.cwd)?;
        let version = Self::next_version(&context, release_type)?;
        info!("The next release version is {version}");
        context.next_release = Some(NextRelease {
            release_type,
            git_tag: context.tag_for(&version),
            version,
            git_head,
            channel: context.branch.prerelease.clone(),
            notes: None,
        });

        let notes = hooks.generate_notes(&mut context).await?;
        let Some(next_release) = context.next_release.as_mut() else {
            return Ok(None);
        };
        next_release.notes = Some(notes.clone());

        if context.options.dry_run {
            warn!("Skip {} tag creation in dry-run mode", next_release.git_tag);
            info!("Release note for version {}:\n{notes}", next_release.version);
            return Ok(Some(ReleaseRecord {
                last_release: context.last_release,
                next_release: next_release.clone(),
                releases: Vec::new(),
            }));
        }

        hooks.prepare(&mut context).await?;
        let published = hooks.publish(&mut context).await?;

        let Some(next_release) = context.next_release else {
            return Ok(None);
        };
        info!(
            "Published release {} on {} channel",
            next_release.version,
            next_release.channel.as_deref().unwrap_or("default")
        );
        Ok(Some(ReleaseRecord {
            last_release: context.last_release,
            next_release,
            releases: published.into_iter().collect(),
        }))
    }
}
