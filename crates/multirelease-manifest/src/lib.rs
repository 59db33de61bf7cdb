mod error;
mod format;
mod manifest;
mod reader;
mod writer;

pub use error::{ManifestError, ManifestErrorKind};
pub use format::{FileFormat, recognize_format};
pub use manifest::Manifest;
pub use reader::{parse_manifest, read_manifest};
pub use writer::write_manifest;
