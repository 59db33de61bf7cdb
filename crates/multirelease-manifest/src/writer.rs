use tracing::debug;

use crate::error::ManifestError;
use crate::manifest::Manifest;

/// Writes the manifest back to its path if one of its values changed. An
/// untouched manifest keeps its bytes, whatever its layout. Returns whether the
/// file was written.
///
/// # Errors
///
/// Returns `ManifestError::Serialize` if the document cannot be encoded, or
/// `ManifestError::Write` if the file cannot be written.
pub fn write_manifest(manifest: &mut Manifest) -> Result<bool, ManifestError> {
    if !manifest.is_modified() {
        debug!(manifest = %manifest.path().display(), "manifest unchanged");
        return Ok(false);
    }

    let rendered = manifest.render()?;

    std::fs::write(manifest.path(), &rendered).map_err(|source| ManifestError::Write {
        path: manifest.path().to_path_buf(),
        source,
    })?;
    debug!(manifest = %manifest.path().display(), "wrote manifest");

    manifest.mark_written();
    Ok(true)
}
