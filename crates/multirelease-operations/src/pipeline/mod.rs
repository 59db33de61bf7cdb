//! A built-in release pipeline: git tags for release history, conventional
//! commit headers for release types, markdown notes and lightweight tags.

mod conventional;
mod engine;
mod notes;
mod plugins;

pub use conventional::{ConventionalCommit, parse_commit, release_type_for};
pub use engine::StandardPipeline;
pub use notes::render_notes;
pub use plugins::StandardPlugins;
