use multirelease_core::{Commit, ReleaseType};

const BREAKING_MARKERS: [&str; 2] = ["BREAKING CHANGE:", "BREAKING-CHANGE:"];

/// A commit whose subject follows `type(scope)!: description`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit<'a> {
    pub kind: &'a str,
    pub scope: Option<&'a str>,
    pub description: &'a str,
    pub breaking: bool,
}

impl ConventionalCommit<'_> {
    #[must_use]
    pub fn release_type(&self) -> Option<ReleaseType> {
        if self.breaking {
            return Some(ReleaseType::Major);
        }
        match self.kind {
            "feat" => Some(ReleaseType::Minor),
            "fix" | "perf" => Some(ReleaseType::Patch),
            _ => None,
        }
    }
}

/// Parses the subject of `commit`. Returns `None` for free-form messages.
#[must_use]
pub fn parse_commit(commit: &Commit) -> Option<ConventionalCommit<'_>> {
    let (prefix, description) = commit.subject().split_once(':')?;
    let description = description.trim();
    if description.is_empty() {
        return None;
    }

    let (prefix, bang) = match prefix.strip_suffix('!') {
        Some(prefix) => (prefix, true),
        None => (prefix, false),
    };
    let (kind, scope) = match prefix.split_once('(') {
        Some((kind, scope)) => (kind, Some(scope.strip_suffix(')')?)),
        None => (prefix, None),
    };
    if kind.is_empty() || !kind.bytes().all(|byte| byte.is_ascii_alphanumeric()) {
        return None;
    }

    let breaking = bang
        || BREAKING_MARKERS
            .iter()
            .any(|marker| commit.message.contains(marker));

    Some(ConventionalCommit {
        kind,
        scope,
        description,
        breaking,
    })
}

/// Most severe release type called for by `commits`.
#[must_use]
pub fn release_type_for(commits: &[Commit]) -> Option<ReleaseType> {
    commits
        .iter()
        .filter_map(|commit| parse_commit(commit)?.release_type())
        .max()
}
