use std::path::Path;

use multirelease_core::DependencyScope;
use serde_json::Value;

use crate::error::ManifestError;
use crate::format::recognize_format;
use crate::manifest::Manifest;

/// # Errors
///
/// Returns `ManifestError::NotFound` or `ManifestError::NotAFile` if there is no
/// file at `path`, `ManifestError::Read` if it cannot be read, and the errors of
/// [`parse_manifest`] otherwise.
pub fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let metadata = std::fs::metadata(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ManifestError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ManifestError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    if !metadata.is_file() {
        return Err(ManifestError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_manifest(path, contents)
}

/// Validates `contents` as a package manifest.
///
/// # Errors
///
/// Returns `ManifestError::Parse` for malformed JSON, `ManifestError::NotAnObject`
/// if the top level is not an object, `ManifestError::InvalidName` if `name` is
/// missing or empty, and `ManifestError::InvalidScope` if a dependency scope is
/// present but not an object.
pub fn parse_manifest(path: &Path, contents: String) -> Result<Manifest, ManifestError> {
    let value: Value = serde_json::from_str(&contents).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Object(document) = value else {
        return Err(ManifestError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let has_name = document
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if !has_name {
        return Err(ManifestError::InvalidName {
            path: path.to_path_buf(),
        });
    }

    for scope in DependencyScope::ALL {
        if document.get(scope.key()).is_some_and(|deps| !deps.is_object()) {
            return Err(ManifestError::InvalidScope {
                path: path.to_path_buf(),
                scope: scope.key().to_string(),
            });
        }
    }

    let format = recognize_format(&contents);
    Ok(Manifest::new(path.to_path_buf(), document, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManifestErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, contents: &str) -> anyhow::Result<std::path::PathBuf> {
        let path = dir.path().join("package.json");
        fs::write(&path, contents)?;
        Ok(path)
    }

    #[test]
    fn reads_valid_manifest() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write(
            &dir,
            r#"{
  "name": "msr-test-a",
  "version": "0.0.0",
  "private": true,
  "dependencies": { "msr-test-c": "*", "left-pad": "^1.0.0" },
  "devDependencies": { "msr-test-c": "*" }
}
"#,
        )?;

        let manifest = read_manifest(&path)?;

        assert_eq!(manifest.name(), "msr-test-a");
        assert_eq!(manifest.version(), Some("0.0.0"));
        assert!(manifest.is_private());
        assert_eq!(
            manifest.dependency(DependencyScope::Dependencies, "left-pad"),
            Some("^1.0.0")
        );
        let names: Vec<_> = manifest.declared_dependency_names().into_iter().collect();
        assert_eq!(names, ["msr-test-c", "left-pad"]);
        assert_eq!(manifest.dependency(DependencyScope::PeerDependencies, "msr-test-c"), None);
        Ok(())
    }

    #[test]
    fn missing_file_is_not_found() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let err = read_manifest(&dir.path().join("package.json")).err();
        assert_eq!(err.map(|e| e.kind()), Some(ManifestErrorKind::NotFound));
        Ok(())
    }

    #[test]
    fn directory_is_not_a_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let err = read_manifest(dir.path()).err();
        assert!(matches!(err, Some(ManifestError::NotAFile { .. })));
        Ok(())
    }

    #[test]
    fn malformed_json_is_syntax_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write(&dir, "{ \"name\": ")?;
        let err = read_manifest(&path).err();
        assert_eq!(err.map(|e| e.kind()), Some(ManifestErrorKind::Syntax));
        Ok(())
    }

    #[test]
    fn non_object_is_type_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write(&dir, "[1, 2, 3]")?;
        let err = read_manifest(&path).err();
        assert!(matches!(err, Some(ManifestError::NotAnObject { .. })));
        Ok(())
    }

    #[test]
    fn empty_name_is_rejected() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        for contents in [r#"{"name": ""}"#, r#"{"version": "1.0.0"}"#, r#"{"name": 7}"#] {
            let path = write(&dir, contents)?;
            let err = read_manifest(&path).err();
            assert!(matches!(err, Some(ManifestError::InvalidName { .. })), "{contents}");
        }
        Ok(())
    }

    #[test]
    fn scope_must_be_object() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write(&dir, r#"{"name": "a", "peerDependencies": "b"}"#)?;
        match read_manifest(&path) {
            Err(ManifestError::InvalidScope { scope, .. }) => {
                assert_eq!(scope, "peerDependencies");
            }
            other => anyhow::bail!("expected InvalidScope, got {other:?}"),
        }
        Ok(())
    }
}
