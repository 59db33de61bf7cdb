mod error;
pub mod arena;
pub mod graph;
pub mod operations;
pub mod pipeline;
pub mod plugin;
pub mod providers;
pub mod resolver;
pub mod synchronizer;
pub mod traits;
pub mod types;
pub mod updater;

#[cfg(test)]
pub mod mocks;

pub use error::{OperationError, Result};
