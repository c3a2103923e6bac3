//! Package-install wrapper
//!
//! Installs are best-effort: the workspace is complete without them and the
//! user can re-run `npm install` by hand, so failures are logged rather than
//! aborting the run.

use std::path::Path;

use crate::process::runner::{self, PromptRule};

/// Run `npm install` in `target_dir`, optionally restricted to a single
/// package. Returns whether the install succeeded.
pub async fn install(target_dir: &Path, package: Option<&str>, rules: &[PromptRule]) -> bool {
    let args: Vec<&str> = match package {
        Some(pkg) => {
            let _ = cliclack::log::info(format!(
                "Installing {} in {}",
                pkg,
                target_dir.display()
            ));
            vec!["install", pkg]
        }
        None => {
            let _ = cliclack::log::info(format!(
                "Installing all dependencies in {}",
                target_dir.display()
            ));
            vec!["install"]
        }
    };

    match runner::run("npm", &args, target_dir, rules).await {
        Ok(result) if result.success => {
            let _ = cliclack::log::success("Dependencies installed");
            true
        }
        Ok(result) => {
            let _ = cliclack::log::warning(format!(
                "Failed to install dependencies in {} (exit code {}): {}",
                target_dir.display(),
                result.exit_code,
                result.stderr.trim()
            ));
            false
        }
        Err(e) => {
            let _ = cliclack::log::warning(format!(
                "Failed to install dependencies in {}: {}",
                target_dir.display(),
                e
            ));
            false
        }
    }
}
