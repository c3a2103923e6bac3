//! Version-control init for the finished workspace

use std::path::Path;

use crate::process::runner;

/// Run `git init` in the workspace root. Best-effort: a missing git binary
/// leaves the workspace usable, so failure is logged and reported, not fatal.
pub async fn init(workspace: &Path) -> bool {
    match runner::run("git", &["init"], workspace, &[]).await {
        Ok(result) if result.success => {
            let _ = cliclack::log::success("Initialized git repository");
            true
        }
        Ok(result) => {
            let _ = cliclack::log::warning(format!(
                "git init failed (exit code {}): {}",
                result.exit_code,
                result.stderr.trim()
            ));
            false
        }
        Err(e) => {
            let _ = cliclack::log::warning(format!("git init failed: {}", e));
            false
        }
    }
}
