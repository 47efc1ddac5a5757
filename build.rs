//! Embeds the short git hash as GIT_HASH for the build info metric

use std::env;
use std::process::Command;

fn short_hash() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "--short", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!hash.is_empty()).then_some(hash)
}

fn main() {
    // Release tarballs have no .git; packagers can pass the hash in
    let git_hash = env::var("FRM_EXPORTER_GIT_HASH")
        .ok()
        .or_else(short_hash)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={git_hash}");
    println!("cargo:rerun-if-env-changed=FRM_EXPORTER_GIT_HASH");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
