use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use multirelease_core::DependencyScope;
use semver::Version;
use serde_json::{Map, Value};

use crate::error::ManifestError;
use crate::format::FileFormat;

/// A validated `package.json`, kept as an ordered JSON object so that a
/// rewrite only changes the values that were actually touched.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    document: Map<String, Value>,
    format: FileFormat,
    /// Set by a setter that changed a value, cleared once the file is written.
    modified: bool,
}

impl Manifest {
    pub(crate) fn new(path: PathBuf, document: Map<String, Value>, format: FileFormat) -> Self {
        Self {
            path,
            document,
            format,
            modified: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the manifest.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.document
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.document.get("version").and_then(Value::as_str)
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        self.document
            .get("private")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether a value changed since the manifest was read or last written.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Arbitrary top-level field, used for embedded configuration such as `release`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    #[must_use]
    pub fn dependency(&self, scope: DependencyScope, name: &str) -> Option<&str> {
        self.document
            .get(scope.key())
            .and_then(Value::as_object)
            .and_then(|deps| deps.get(name))
            .and_then(Value::as_str)
    }

    /// Names declared in any of the four dependency scopes.
    #[must_use]
    pub fn declared_dependency_names(&self) -> IndexSet<String> {
        DependencyScope::ALL
            .iter()
            .filter_map(|scope| self.document.get(scope.key()).and_then(Value::as_object))
            .flat_map(|deps| deps.keys().cloned())
            .collect()
    }

    /// Sets the declared range of an existing dependency. Returns `true` if the value changed.
    pub fn set_dependency(&mut self, scope: DependencyScope, name: &str, range: &str) -> bool {
        let Some(slot) = self
            .document
            .get_mut(scope.key())
            .and_then(Value::as_object_mut)
            .and_then(|deps| deps.get_mut(name))
        else {
            return false;
        };
        if slot.as_str() == Some(range) {
            return false;
        }
        *slot = Value::String(range.to_string());
        self.modified = true;
        true
    }

    pub fn set_version(&mut self, version: &Version) {
        let version = version.to_string();
        if self.version() == Some(version.as_str()) {
            return;
        }
        self.document
            .insert("version".to_string(), Value::String(version));
        self.modified = true;
    }

    /// Serializes the document with the detected indentation and trailing whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Serialize` if the document cannot be encoded.
    pub fn render(&self) -> Result<String, ManifestError> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(self.format.indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        serde::Serialize::serialize(&self.document, &mut serializer).map_err(|source| {
            ManifestError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut rendered = String::from_utf8_lossy(&buffer).into_owned();
        rendered.push_str(&self.format.trailing_whitespace);
        Ok(rendered)
    }

    pub(crate) fn mark_written(&mut self) {
        self.modified = false;
    }
}
