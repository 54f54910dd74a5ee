// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=GEOSTAMP_VERSION");

    // Packagers can pin the version string
    let version = std::env::var("GEOSTAMP_VERSION")
        .ok()
        .or_else(git_version)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `0.1.0-abcdef1` at a tag, `0.1.0-dirty-abcdef1` after it, or `None`
/// outside a git checkout
fn git_version() -> Option<String> {
    let describe = run_git(&["describe", "--tags", "--match", "v*"]);
    let commit = run_git(&["rev-parse", "--short", "HEAD"])?;

    let Some(describe) = describe else {
        return Some(format!("{}-{}", env!("CARGO_PKG_VERSION"), commit));
    };
    let describe = describe.strip_prefix('v').unwrap_or(&describe);

    // "0.1.0-5-gabcdef1": commits after the tag
    let parts: Vec<&str> = describe.rsplitn(3, '-').collect();
    if parts.len() == 3 {
        let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
        Some(format!("{}-dirty-{}", parts[2], hash))
    } else {
        Some(format!("{}-{}", describe, commit))
    }
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
