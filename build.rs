//! Build provenance for `surch --version`

use std::process::Command;

/// Abbreviated commit of the source tree, when built from a checkout
fn source_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()?;
    let revision = String::from_utf8(output.stdout).ok()?;
    let revision = revision.trim();
    (output.status.success() && !revision.is_empty()).then(|| revision.to_string())
}

fn main() {
    let revision = source_revision().unwrap_or_else(|| "unreleased".to_string());
    println!("cargo:rustc-env=SURCH_SOURCE_REVISION={revision}");
    println!(
        "cargo:rustc-env=SURCH_BUILD_DATE={}",
        chrono::Utc::now().format("%Y-%m-%d")
    );
    println!("cargo:rerun-if-changed=.git/HEAD");
}
