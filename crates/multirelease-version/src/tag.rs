use semver::Version;

/// First identifier of the prerelease part: `rc` for `1.0.0-rc.0`.
#[must_use]
pub fn prerelease_channel(version: &Version) -> Option<&str> {
    if version.pre.is_empty() {
        return None;
    }
    version.pre.split('.').next().filter(|id| !id.is_empty())
}

/// Extracts the version from a `<name>@<version>` release tag.
///
/// A tag without the package prefix is read as a bare version. Anything that is
/// not a full semantic version yields `None`.
#[must_use]
pub fn version_from_tag(name: Option<&str>, tag: &str) -> Option<Version> {
    let candidate = name
        .and_then(|name| tag.strip_prefix(name))
        .and_then(|rest| rest.strip_prefix('@'))
        .unwrap_or(tag);
    Version::parse(candidate).ok()
}
