use std::fmt::Write;

use multirelease_core::Commit;
use semver::Version;

use super::conventional::{ConventionalCommit, parse_commit};

const SHORT_HASH: usize = 7;

struct Section {
    title: &'static str,
    entries: Vec<String>,
}

/// Markdown release notes: a `## <version> (<date>)` heading followed by one
/// section per kind of change. Commits that do not affect the release are left out.
#[must_use]
pub fn render_notes(version: &Version, date: &str, commits: &[Commit]) -> String {
    let mut sections = [
        Section {
            title: "BREAKING CHANGES",
            entries: Vec::new(),
        },
        Section {
            title: "Features",
            entries: Vec::new(),
        },
        Section {
            title: "Bug Fixes",
            entries: Vec::new(),
        },
        Section {
            title: "Performance Improvements",
            entries: Vec::new(),
        },
    ];

    for commit in commits {
        let Some(parsed) = parse_commit(commit) else {
            continue;
        };
        let entry = entry(&parsed, &commit.hash);
        if parsed.breaking {
            sections[0].entries.push(entry.clone());
        }
        let index = match parsed.kind {
            "feat" => 1,
            "fix" => 2,
            "perf" => 3,
            _ => continue,
        };
        sections[index].entries.push(entry);
    }

    let mut notes = format!("## {version} ({date})");
    for section in sections.iter().filter(|section| !section.entries.is_empty()) {
        let _ = write!(notes, "\n\n### {}\n\n{}", section.title, section.entries.join("\n"));
    }
    notes.push('\n');
    notes
}

fn entry(commit: &ConventionalCommit<'_>, hash: &str) -> String {
    let short = hash.get(..SHORT_HASH).unwrap_or(hash);
    match commit.scope {
        Some(scope) => format!("* **{scope}:** {} ({short})", commit.description),
        None => format!("* {} ({short})", commit.description),
    }
}
