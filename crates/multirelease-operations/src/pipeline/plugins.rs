use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use multirelease_core::{PublishedRelease, ReleaseType};
use multirelease_manifest::{read_manifest, write_manifest};
use tracing::{debug, info};

use super::conventional::release_type_for;
use super::notes::render_notes;
use crate::traits::{GitProvider, LifecycleHooks, ReleaseContext};
use crate::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Hooks that read conventional commits, write the released version into the
/// package manifest and tag the release commit.
pub struct StandardPlugins<G: GitProvider> {
    git: Arc<G>,
}

impl<G: GitProvider> StandardPlugins<G> {
    #[must_use]
    pub fn new(git: Arc<G>) -> Self {
        Self { git }
    }
}

#[async_trait]
impl<G: GitProvider + 'static> LifecycleHooks for StandardPlugins<G> {
    async fn verify_conditions(&self, context: &mut ReleaseContext) -> Result<()> {
        read_manifest(&context.manifest_path)?;
        Ok(())
    }

    async fn analyze_commits(&self, context: &mut ReleaseContext) -> Result<Option<ReleaseType>> {
        Ok(release_type_for(&context.commits))
    }

    async fn generate_notes(&self, context: &mut ReleaseContext) -> Result<String> {
        let Some(next) = context.next_release.as_ref() else {
            return Ok(String::new());
        };
        let date = Local::now().format(DATE_FORMAT).to_string();
        Ok(render_notes(&next.version, &date, &context.commits))
    }

    async fn prepare(&self, context: &mut ReleaseContext) -> Result<()> {
        let Some(next) = context.next_release.as_ref() else {
            return Ok(());
        };
        let mut manifest = read_manifest(&context.manifest_path)?;
        manifest.set_version(&next.version);
        if write_manifest(&mut manifest)? {
            debug!(manifest = %context.manifest_path.display(), version = %next.version, "wrote version");
        }
        Ok(())
    }

    async fn publish(&self, context: &mut ReleaseContext) -> Result<Option<PublishedRelease>> {
        let Some(next) = context.next_release.as_ref() else {
            return Ok(None);
        };
        let tag = self.git.create_tag(&context.cwd, &next.git_tag, &next.git_head)?;
        info!("Created tag {}", tag.name);

        Ok(Some(PublishedRelease {
            name: context.package_name.clone(),
            version: next.version.clone(),
            git_tag: tag.name,
            channel: next.channel.clone(),
        }))
    }
}
