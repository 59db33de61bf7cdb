use multirelease_core::BumpStrategy;
use semver::Version;

use crate::range::satisfies;

pub const WORKSPACE_PROTOCOL: &str = "workspace:";

/// Removes the `workspace:` protocol prefix from a declared range, if present.
#[must_use]
pub fn strip_workspace_protocol(range: &str) -> &str {
    range.strip_prefix(WORKSPACE_PROTOCOL).unwrap_or(range)
}

/// Computes the range a dependent should declare for a dependency released as `next`.
///
/// `prefix` is put in front of the bare version whenever the range is replaced
/// outright. Ranges using the `workspace:` protocol are rewritten without it, and
/// the shorthand forms `workspace:*`, `workspace:^` and `workspace:~` always
/// materialize into a concrete version.
#[must_use]
pub fn resolve_next_version(
    current: &str,
    next: &Version,
    strategy: BumpStrategy,
    prefix: &str,
) -> String {
    let range = strip_workspace_protocol(current);

    if strategy == BumpStrategy::Ignore {
        return range.to_string();
    }

    if range.len() < current.len() {
        match range {
            "*" => return format!("{prefix}{next}"),
            "^" | "~" => return format!("{range}{next}"),
            _ => {}
        }
    }

    match strategy {
        BumpStrategy::Satisfy | BumpStrategy::Inherit if satisfies(next, range) => {
            range.to_string()
        }
        BumpStrategy::Inherit => inherit_shape(range, next),
        _ => format!("{prefix}{next}"),
    }
}

/// Replaces the first run of digits in each dot-separated chunk of `range` with
/// the matching chunk of `next`, keeping operators and wildcards in place.
fn inherit_shape(range: &str, next: &Version) -> String {
    let next = next.to_string();
    let next_chunks: Vec<&str> = next.split('.').collect();

    range
        .split('.')
        .enumerate()
        .map(|(i, chunk)| match next_chunks.get(i) {
            Some(replacement) => replace_first_number(chunk, replacement),
            None => chunk.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn replace_first_number(chunk: &str, replacement: &str) -> String {
    let Some(start) = chunk.find(|c: char| c.is_ascii_digit()) else {
        return chunk.to_string();
    };
    let end = chunk[start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(chunk.len(), |offset| start + offset);
    format!("{}{replacement}{}", &chunk[..start], &chunk[end..])
}
