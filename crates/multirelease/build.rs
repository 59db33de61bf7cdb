use std::process::Command;

use chrono::Utc;

fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs/");

    let version = env!("CARGO_PKG_VERSION");
    let version_string = match git_short_hash() {
        Some(_) if is_tagged_release(version) => version.to_owned(),
        Some(hash) => {
            let build_date = Utc::now().format("%Y%m%d");
            format!("{version}+{hash}.{build_date}")
        }
        None => version.to_owned(),
    };

    println!("cargo:rustc-env=MULTI_RELEASE_VERSION={version_string}");
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    output
        .status
        .success()
        .then(|| String::from_utf8(output.stdout).ok())
        .flatten()
        .map(|hash| hash.trim().to_owned())
}

/// Whether HEAD carries the `multi-release@<version>` tag this tool itself would create.
fn is_tagged_release(version: &str) -> bool {
    let expected_tag = format!("multi-release@{version}");

    Command::new("git")
        .args(["tag", "--points-at", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .is_some_and(|tags| tags.lines().any(|line| line.trim() == expected_tag))
}
