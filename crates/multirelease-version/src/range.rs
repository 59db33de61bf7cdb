//! npm range syntax on top of [`semver::VersionReq`].
//!
//! The `semver` crate reads ranges the way Cargo does, which differs from npm in
//! a few places: a bare version is a caret requirement in Cargo but an exact
//! match in npm, comparators are separated by whitespace instead of commas, and
//! npm also has `||` alternatives and `a - b` hyphen ranges. Ranges are
//! translated into one `VersionReq` per alternative.

use semver::{Version, VersionReq};

const OPERATORS: [&str; 7] = [">=", "<=", ">", "<", "=", "^", "~"];

/// Returns whether `version` is accepted by the npm `range`.
/// An unparsable range accepts nothing.
#[must_use]
pub fn satisfies(version: &Version, range: &str) -> bool {
    parse_range(range).is_some_and(|alternatives| alternatives.iter().any(|req| req.matches(version)))
}

/// Translates an npm range into its `||` alternatives.
#[must_use]
pub fn parse_range(range: &str) -> Option<Vec<VersionReq>> {
    range
        .split("||")
        .map(|set| VersionReq::parse(&translate_set(set.trim())?).ok())
        .collect()
}

fn translate_set(set: &str) -> Option<String> {
    if set.is_empty() {
        return Some("*".to_string());
    }

    let tokens = merge_operators(set.split_whitespace());

    if let [low, dash, high] = tokens.as_slice() {
        if dash == "-" {
            return Some(format!(
                ">={}, <={}",
                normalize_partial(low)?,
                normalize_partial(high)?
            ));
        }
    }

    let mut comparators = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let comparator = translate_comparator(token)?;
        // `*` next to other comparators adds nothing and VersionReq rejects the mix
        if comparator != "*" {
            comparators.push(comparator);
        }
    }
    if comparators.is_empty() {
        return Some("*".to_string());
    }
    Some(comparators.join(", "))
}

/// Glues a detached operator to the version after it: `>= 1.2.3` becomes `>=1.2.3`.
fn merge_operators<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let mut pending: Option<&str> = None;
    for token in tokens {
        if OPERATORS.contains(&token) {
            pending = Some(token);
            continue;
        }
        match pending.take() {
            Some(op) => merged.push(format!("{op}{token}")),
            None => merged.push(token.to_string()),
        }
    }
    if let Some(op) = pending {
        merged.push(op.to_string());
    }
    merged
}

fn translate_comparator(token: &str) -> Option<String> {
    let (op, version) = split_operator(token);
    let version = normalize_partial(version)?;
    if version == "*" {
        return Some(match op {
            "<" => "<0.0.0-0".to_string(),
            _ => "*".to_string(),
        });
    }
    let op = if op.is_empty() { "=" } else { op };
    Some(format!("{op}{version}"))
}

fn split_operator(token: &str) -> (&str, &str) {
    OPERATORS
        .iter()
        .find_map(|op| token.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("", token))
}

/// Drops a leading `v` and trailing wildcard segments: `v1.2.x` becomes `1.2`.
fn normalize_partial(version: &str) -> Option<String> {
    let version = version.trim().trim_start_matches(['v', 'V']);
    if version.is_empty() {
        return Some("*".to_string());
    }

    let (core, suffix) = match version.find(['-', '+']) {
        Some(index) => version.split_at(index),
        None => (version, ""),
    };

    let mut parts = Vec::new();
    for part in core.split('.') {
        if matches!(part, "x" | "X" | "*") {
            break;
        }
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        parts.push(part);
    }

    if parts.is_empty() {
        return Some("*".to_string());
    }
    if parts.len() < 3 {
        return Some(parts.join("."));
    }
    Some(format!("{}{suffix}", parts.join(".")))
}
