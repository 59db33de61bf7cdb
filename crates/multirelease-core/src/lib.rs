pub mod error;
pub mod release;
pub mod types;

pub use error::*;
pub use release::*;
pub use types::*;
