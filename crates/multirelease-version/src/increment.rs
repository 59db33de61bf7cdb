use multirelease_core::ReleaseType;
use semver::{BuildMetadata, Prerelease, Version};

use crate::tag::prerelease_channel;

/// Increments `version` the way npm does: a prerelease of the target version is
/// promoted instead of skipped, so `1.0.0-dev.1` bumped by `major` is `1.0.0`.
#[must_use]
pub fn increment(version: &Version, release_type: ReleaseType) -> Version {
    let mut next = version.clone();
    next.build = BuildMetadata::EMPTY;
    let is_prerelease = !version.pre.is_empty();

    match release_type {
        ReleaseType::Major => {
            if !(is_prerelease && version.minor == 0 && version.patch == 0) {
                next.major += 1;
            }
            next.minor = 0;
            next.patch = 0;
        }
        ReleaseType::Minor => {
            if !(is_prerelease && version.patch == 0) {
                next.minor += 1;
            }
            next.patch = 0;
        }
        ReleaseType::Patch => {
            if !is_prerelease {
                next.patch += 1;
            }
        }
    }

    next.pre = Prerelease::EMPTY;
    next
}

/// Bumps the prerelease counter on `channel`.
///
/// A release version moves to the next patch and starts the channel at `0`.
/// A prerelease on another channel restarts at `<channel>.0`.
///
/// # Errors
///
/// Returns an error if `channel` is not a valid prerelease identifier.
pub fn increment_prerelease(version: &Version, channel: &str) -> Result<Version, semver::Error> {
    let mut next = version.clone();
    next.build = BuildMetadata::EMPTY;

    if version.pre.is_empty() {
        next.patch += 1;
        next.pre = Prerelease::new(&format!("{channel}.0"))?;
        return Ok(next);
    }

    if prerelease_channel(version) != Some(channel) {
        next.pre = Prerelease::new(&format!("{channel}.0"))?;
        return Ok(next);
    }

    let mut identifiers: Vec<String> = version.pre.split('.').map(str::to_string).collect();
    match identifiers
        .iter()
        .rposition(|id| id.parse::<u64>().is_ok())
    {
        Some(index) => {
            let counter = identifiers[index].parse::<u64>().unwrap_or_default() + 1;
            identifiers[index] = counter.to_string();
        }
        None => identifiers.push("0".to_string()),
    }
    next.pre = Prerelease::new(&identifiers.join("."))?;
    Ok(next)
}

/// Next version of a package on a release branch.
#[must_use]
pub fn next_version(last: Option<&Version>, release_type: Option<ReleaseType>) -> Version {
    match (last, release_type) {
        (None, _) => Version::new(1, 0, 0),
        (Some(last), Some(release_type)) => increment(last, release_type),
        (Some(last), None) => last.clone(),
    }
}

/// Next version of a package on the prerelease `channel`.
///
/// `existing` holds versions already tagged for this package. They can be ahead of
/// `last` (for instance after a partial run), and the counter never reuses one of them.
///
/// # Errors
///
/// Returns an error if `channel` is not a valid prerelease identifier.
pub fn next_pre_version(
    last: Option<&Version>,
    release_type: Option<ReleaseType>,
    channel: &str,
    existing: &[Version],
) -> Result<Version, semver::Error> {
    let Some(last) = last else {
        return first_on_channel(channel);
    };

    match prerelease_channel(last) {
        None => {
            let mut next = increment(last, release_type.unwrap_or(ReleaseType::Patch));
            next.pre = Prerelease::new(&format!("{channel}.1"))?;
            Ok(next)
        }
        Some(current) if current != channel => first_on_channel(channel),
        Some(_) => {
            let from_last = increment_prerelease(last, channel)?;
            let highest_tag = existing
                .iter()
                .filter(|version| prerelease_channel(version) == Some(channel))
                .max();
            match highest_tag {
                Some(tagged) => Ok(from_last.max(increment_prerelease(tagged, channel)?)),
                None => Ok(from_last),
            }
        }
    }
}

fn first_on_channel(channel: &str) -> Result<Version, semver::Error> {
    let mut version = Version::new(1, 0, 0);
    version.pre = Prerelease::new(&format!("{channel}.1"))?;
    Ok(version)
}
