//! Workspace lifecycle
//!
//! Re-running the tool against an existing workspace is destructive by
//! contract: the prior directory is wiped and recreated, which is what makes
//! a re-run indistinguishable from a first run. The `confirm` hook is the
//! seam for a safety prompt before the wipe.

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::fs;

use crate::fsops;

/// Create the workspace directory.
///
/// If it already exists, `confirm` decides whether to proceed; on approval
/// the directory is deleted recursively and recreated. Any creation failure
/// other than "already exists" is fatal.
pub async fn prepare<F>(path: &Path, confirm: F) -> Result<()>
where
    F: FnOnce(&Path) -> bool,
{
    match fs::create_dir(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            if !confirm(path) {
                bail!("Init cancelled: {} already exists", path.display());
            }
            fsops::remove_dir(path)
                .await
                .with_context(|| format!("Failed to clean existing workspace {}", path.display()))?;
            fs::create_dir(path)
                .await
                .with_context(|| format!("Failed to recreate workspace {}", path.display()))?;
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to create workspace {}", path.display())),
    }
}
