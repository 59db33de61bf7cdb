mod git_provider;
mod lifecycle;

pub use git_provider::GitProvider;
pub use lifecycle::{LifecycleHooks, PipelineEngine, ReleaseContext};
