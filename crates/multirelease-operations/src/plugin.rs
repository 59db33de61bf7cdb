use std::sync::Arc;

use async_trait::async_trait;
use multirelease_core::{Commit, PublishedRelease, ReleaseType};
use tracing::debug;

use crate::arena::{Package, PackageArena, PackageId, PackageState, Probe};
use crate::resolver::CascadeResolver;
use crate::synchronizer::{Gate, Synchronizer};
use crate::traits::{GitProvider, LifecycleHooks, ReleaseContext};
use crate::types::RunOptions;
use crate::updater::ManifestUpdater;
use crate::Result;

/// Builds the per-package hooks of one run.
pub struct InlinePluginCreator {
    sync: Arc<Synchronizer>,
    git: Arc<dyn GitProvider>,
    plugins: Arc<dyn LifecycleHooks>,
    options: Arc<RunOptions>,
}

impl InlinePluginCreator {
    #[must_use]
    pub fn new(
        sync: Arc<Synchronizer>,
        git: Arc<dyn GitProvider>,
        plugins: Arc<dyn LifecycleHooks>,
        options: Arc<RunOptions>,
    ) -> Self {
        Self {
            sync,
            git,
            plugins,
            options,
        }
    }

    #[must_use]
    pub fn create(&self, id: PackageId) -> InlinePlugin {
        InlinePlugin {
            id,
            sync: Arc::clone(&self.sync),
            git: Arc::clone(&self.git),
            plugins: Arc::clone(&self.plugins),
            options: Arc::clone(&self.options),
        }
    }
}

/// Lifecycle hooks of one package.
///
/// Each hook delegates to the configured plugins and adds the waits that keep
/// the package in step with the rest of the run:
///
/// * `analyze_commits` resolves the cascade once every pending package has analyzed.
/// * `generate_notes` waits for every releasing package to know its next version.
/// * `prepare` waits for the tagging gate before rewriting the manifest.
/// * `publish` hands the tagging gate to the next releasing package whose
///   releasing dependencies are all tagged.
pub struct InlinePlugin {
    id: PackageId,
    sync: Arc<Synchronizer>,
    git: Arc<dyn GitProvider>,
    plugins: Arc<dyn LifecycleHooks>,
    options: Arc<RunOptions>,
}

impl InlinePlugin {
    fn package(&self) -> &Package {
        self.sync.arena().package(self.id)
    }

    /// Commits of the package between its last release and the release being cut.
    fn commits(&self, context: &ReleaseContext) -> Result<Vec<Commit>> {
        let since = context.last_release.as_ref().map(|release| release.git_head.as_str());
        let until = context.next_release.as_ref().map(|release| release.git_head.as_str());
        let first_parent_branch = self
            .options
            .first_parent
            .then_some(context.branch.name.as_str());

        self.git.commits_for(
            &context.cwd,
            &context.package_dir,
            since,
            until,
            first_parent_branch,
        )
    }

    /// `* **<name>:** upgraded to <version>` for every local dependency with a new release.
    fn dependency_upgrades(&self) -> Vec<String> {
        let arena = self.sync.arena();
        self.package()
            .local_deps
            .iter()
            .filter_map(|&dep| {
                let state = arena.state(dep);
                let release = state.next_release.as_ref()?;
                Some(format!(
                    "* **{}:** upgraded to {}",
                    arena.package(dep).name,
                    release.version
                ))
            })
            .collect()
    }

    fn pass_ready(&self) {
        self.sync.mark(self.id, Probe::Ready);
        if self.options.sequential_init {
            self.sync.pass_to(Gate::ReadyForRelease, |arena, id| {
                !arena.state(id).has(Probe::Ready)
            });
        }
    }

    fn pass_tagging(&self) {
        self.sync.mark(self.id, Probe::Tagged);
        if self.sync.is_signaled(Gate::ReadyForTagging, self.id) {
            self.sync.pass_to(Gate::ReadyForTagging, may_tag);
        } else {
            self.sync.offer(Gate::ReadyForTagging, may_tag);
        }
    }

    /// Releases every gate this package still holds. Called once its outcome
    /// is recorded, so packages waiting on it may tag.
    pub fn settle(&self) {
        let (ready, tagged) = {
            let state = self.sync.arena().state(self.id);
            (state.has(Probe::Ready), state.has(Probe::Tagged))
        };
        if !ready {
            self.pass_ready();
        }
        if !tagged && self.sync.is_signaled(Gate::ReadyForTagging, self.id) {
            self.pass_tagging();
        } else {
            self.sync.offer(Gate::ReadyForTagging, may_tag);
        }
    }
}

/// A resolved, releasing package may tag once every releasing dependency
/// outside its cycle group has tagged or stopped.
fn may_tag(arena: &PackageArena, id: PackageId) -> bool {
    let waiting = {
        let state = arena.state(id);
        state.has(Probe::Resolved) && state.next_type.is_some() && !state.has(Probe::Tagged)
    };
    let package = arena.package(id);
    waiting
        && package
            .local_deps
            .iter()
            .filter(|&&dep| arena.package(dep).cycle_group != package.cycle_group)
            .all(|&dep| dependency_settled(&arena.state(dep)))
}

fn dependency_settled(state: &PackageState) -> bool {
    !state.is_pending()
        || state.has(Probe::Tagged)
        || (state.has(Probe::Resolved) && state.next_type.is_none())
}

fn has_release_type(state: &PackageState) -> bool {
    state.next_type.is_some()
}

/// Puts the package name into the leading version heading: `## 1.0.0` becomes `## <name> 1.0.0`.
fn with_package_title(notes: &str, name: &str) -> String {
    let level = notes.bytes().take_while(|&byte| byte == b'#').count();
    if level == 0 {
        return notes.to_string();
    }
    let Some(rest) = notes[level..].strip_prefix(' ') else {
        return notes.to_string();
    };
    if !starts_with_version(rest) {
        return notes.to_string();
    }
    format!("{} {name} {rest}", &notes[..level])
}

fn starts_with_version(text: &str) -> bool {
    let text = text.strip_prefix('[').unwrap_or(text);
    let mut parts = text.splitn(3, '.');
    let is_number = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());

    match (parts.next(), parts.next(), parts.next()) {
        (Some(major), Some(minor), Some(rest)) => {
            is_number(major) && is_number(minor) && rest.starts_with(|c: char| c.is_ascii_digit())
        }
        _ => false,
    }
}

#[async_trait]
impl LifecycleHooks for InlinePlugin {
    async fn verify_conditions(&self, context: &mut ReleaseContext) -> Result<()> {
        context.options = self.package().options.clone();
        self.pass_ready();
        self.plugins.verify_conditions(context).await
    }

    async fn analyze_commits(&self, context: &mut ReleaseContext) -> Result<Option<ReleaseType>> {
        let commits = self.commits(context)?;
        context.commits = commits;
        {
            let mut state = self.sync.arena().state_mut(self.id);
            state.prerelease = context.branch.prerelease.clone();
            state.last_release = context.last_release.clone();
            state.release_versions = context.release_versions.clone();
        }

        let analyzed = self.plugins.analyze_commits(context).await?;
        {
            let mut state = self.sync.arena().state_mut(self.id);
            state.next_type = state.next_type.max(analyzed);
        }
        debug!(commits = context.commits.len(), ?analyzed, "analyzed commits");

        self.sync.mark(self.id, Probe::Analyzed);
        self.sync.wait_all_reached(Probe::Analyzed, None).await;

        let resolved =
            CascadeResolver::new(self.sync.arena(), &self.options.deps).resolve(self.id)?;
        self.sync.mark(self.id, Probe::Resolved);
        Ok(resolved)
    }

    async fn generate_notes(&self, context: &mut ReleaseContext) -> Result<String> {
        self.sync.arena().state_mut(self.id).next_release = context.next_release.clone();
        self.sync.mark(self.id, Probe::NextRelease);
        self.sync.wait_all_reached(Probe::Resolved, None).await;
        self.sync
            .wait_all_reached(Probe::NextRelease, Some(has_release_type))
            .await;

        let commits = self.commits(context)?;
        context.commits = commits;
        let notes = self.plugins.generate_notes(context).await?;

        let mut sections = Vec::new();
        if !notes.trim().is_empty() {
            sections.push(with_package_title(notes.trim_end(), &self.package().name));
        }
        let upgrades = self.dependency_upgrades();
        if !upgrades.is_empty() {
            sections.push("### Dependencies".to_string());
            sections.push(upgrades.join("\n"));
        }

        // Dry runs stop after the notes, so nobody will publish and pass the gate on.
        if context.options.dry_run {
            self.pass_tagging();
        }

        Ok(sections.join("\n\n"))
    }

    async fn prepare(&self, context: &mut ReleaseContext) -> Result<()> {
        self.sync.offer(Gate::ReadyForTagging, may_tag);
        self.sync.wait_for(Gate::ReadyForTagging, self.id).await;

        ManifestUpdater::new(self.sync.arena(), &self.options.deps).update(self.id)?;
        self.sync.mark(self.id, Probe::DepsUpdated);

        self.plugins.prepare(context).await?;
        self.sync.mark(self.id, Probe::Prepared);
        Ok(())
    }

    async fn publish(&self, context: &mut ReleaseContext) -> Result<Option<PublishedRelease>> {
        let published = self.plugins.publish(context).await?;
        self.sync.mark(self.id, Probe::Published);
        self.pass_tagging();
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::tests::{arena, manifest};
    use crate::mocks::MockGitProvider;
    use crate::pipeline::StandardPlugins;
    use crate::types::PackageOutcome;
    use multirelease_core::{BranchSpec, DependencyScope, LastRelease};
    use semver::Version;
    use std::path::PathBuf;

    fn last_release(name: &str, git_head: &str) -> LastRelease {
        LastRelease {
            version: Version::new(1, 0, 0),
            git_tag: format!("{name}@1.0.0"),
            git_head: git_head.to_string(),
        }
    }

    fn context(arena: &PackageArena, id: PackageId, last: LastRelease) -> ReleaseContext {
        let package = arena.package(id);
        ReleaseContext {
            cwd: PathBuf::from("/workspace"),
            package_name: package.name.clone(),
            package_dir: package.dir.clone(),
            manifest_path: package.manifest_path.clone(),
            branch: BranchSpec::release("main"),
            options: package.options.clone(),
            commits: Vec::new(),
            last_release: Some(last),
            next_release: None,
            release_versions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn analyze_commits_twice_gives_the_same_answer() -> anyhow::Result<()> {
        let arena = Arc::new(arena(vec![
            manifest("a", r#", "dependencies": { "b": "1.0.0" }"#),
            manifest("b", ""),
        ]));
        let git = Arc::new(MockGitProvider::new());
        let head = git.commit("packages/b", "feat: b");
        {
            let mut b = arena.state_mut(1);
            b.last_release = Some(last_release("b", &head));
            b.next_type = Some(ReleaseType::Minor);
        }
        let sync = Arc::new(Synchronizer::new(Arc::clone(&arena)));
        sync.start(0);
        let plugin = InlinePluginCreator::new(
            Arc::clone(&sync),
            Arc::clone(&git) as Arc<dyn GitProvider>,
            Arc::new(StandardPlugins::new(Arc::clone(&git))),
            Arc::new(RunOptions::default()),
        )
        .create(0);
        let mut context = context(&arena, 0, last_release("a", &head));

        let first = plugin.analyze_commits(&mut context).await?;
        let rendered = arena.state(0).manifest.render()?;
        let second = plugin.analyze_commits(&mut context).await?;

        assert_eq!(first, Some(ReleaseType::Patch));
        assert_eq!(second, first);
        assert_eq!(arena.state(0).manifest.render()?, rendered);
        assert_eq!(
            arena.state(0).manifest.dependency(DependencyScope::Dependencies, "b"),
            Some("1.1.0")
        );
        Ok(())
    }

    #[test]
    fn tagging_waits_for_releasing_dependencies_outside_the_cycle() {
        let arena = arena(vec![
            manifest("a", r#", "dependencies": { "b": "*", "c": "*" }"#),
            manifest("b", r#", "dependencies": { "a": "*" }"#),
            manifest("c", ""),
        ]);
        for id in 0..3 {
            let mut state = arena.state_mut(id);
            state.start();
            state.set(Probe::Resolved);
            state.next_type = Some(ReleaseType::Patch);
        }

        assert!(!may_tag(&arena, 0));
        assert!(!may_tag(&arena, 1));
        assert!(may_tag(&arena, 2));

        arena.state_mut(2).set(Probe::Tagged);
        assert!(may_tag(&arena, 0));
        assert!(may_tag(&arena, 1));
        assert!(!may_tag(&arena, 2));
    }

    #[test]
    fn finished_or_unchanged_dependencies_do_not_block_tagging() {
        let arena = arena(vec![
            manifest("a", r#", "dependencies": { "b": "*", "c": "*" }"#),
            manifest("b", ""),
            manifest("c", ""),
        ]);
        for id in 0..3 {
            let mut state = arena.state_mut(id);
            state.start();
            state.set(Probe::Resolved);
        }
        arena.state_mut(0).next_type = Some(ReleaseType::Minor);
        {
            let mut b = arena.state_mut(1);
            b.next_type = Some(ReleaseType::Patch);
            b.finish(PackageOutcome::Unchanged);
        }

        assert!(may_tag(&arena, 0));
    }

    #[test]
    fn package_name_goes_into_the_version_heading() {
        let cases = [
            ("## 1.0.0 (2024-01-01)", "## msr-test-a 1.0.0 (2024-01-01)"),
            ("# [2.1.0](https://x) (2024-01-01)", "# msr-test-a [2.1.0](https://x) (2024-01-01)"),
            ("### 10.20.30-beta.1\n\n* fix", "### msr-test-a 10.20.30-beta.1\n\n* fix"),
            ("## Features", "## Features"),
            ("##1.0.0", "##1.0.0"),
            ("* 1.0.0", "* 1.0.0"),
            ("## 1.0", "## 1.0"),
        ];

        for (notes, expected) in cases {
            assert_eq!(with_package_title(notes, "msr-test-a"), expected, "notes: {notes}");
        }
    }

    #[test]
    fn only_the_leading_heading_is_renamed() {
        let notes = "## 1.0.0\n\n## 0.9.0";

        assert_eq!(
            with_package_title(notes, "pkg"),
            "## pkg 1.0.0\n\n## 0.9.0"
        );
    }
}
