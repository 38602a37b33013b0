//! Embeds `DOCREPO_VERSION`: the package version, plus the commit hash
//! when built from a git checkout.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    let package = env!("CARGO_PKG_VERSION");
    let version = match commit_hash() {
        Some(hash) => format!("{package} ({hash})"),
        None => package.to_string(),
    };

    println!("cargo:rustc-env=DOCREPO_VERSION={version}");
}

fn commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;

    let hash = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!hash.is_empty()).then_some(hash)
}
