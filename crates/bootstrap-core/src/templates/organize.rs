//! Placing fetched assets into the workspace
//!
//! Three operations run against the extracted bundle, in flow order: the
//! replacement entry scripts go over the generated `bin/`, the two frontend
//! helper files are placed next to the generated frontend, and the remaining
//! template tree is copied wholesale (minus those helpers, which would
//! otherwise be overwritten in place).

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;

use crate::assets::AssetBundle;
use crate::fsops::{self, FsError};
use crate::options::CliOptions;

/// Files placed individually during frontend setup and skipped by the bulk copy.
pub const AUX_FILES: &[&str] = &["userCtx.tsx", "serverUtils.ts"];

/// Command line the patched infrastructure manifest boots through.
const ENTRY_COMMAND: &str = "npx ts-node --prefer-ts-exts bin/backend.ts";
const ENTRY_SCRIPT: &str = "bin/backend.ts";

/// References the entry point makes to the notifications stack; both are
/// stripped when hosting on the shared domain.
const NOTIFICATIONS_IMPORT: &str =
    "import { NotificationStack } from '../lib/notifications';";
const NOTIFICATIONS_DEPENDENCY: &str = "apistack.addDependency(notificationsStack, 'We need the SNS topics to exists before we can create the API')";

/// Replace the generator's `bin/` scaffolding with the bundle's entry scripts
/// and point both generated config manifests at the new entry point.
pub async fn install_entry_scripts(workspace: &Path, bundle: &AssetBundle) -> Result<()> {
    fsops::copy_dir(&bundle.bin_dir(), &workspace.join("bin"))
        .await
        .context("Failed to copy entry scripts")?;
    rewrite_entry_field(&workspace.join("cdk.json"), "app", ENTRY_COMMAND).await?;
    rewrite_entry_field(&workspace.join("package.json"), "main", ENTRY_SCRIPT).await?;
    Ok(())
}

async fn rewrite_entry_field(path: &Path, field: &str, value: &str) -> Result<()> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut doc: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    doc.as_object_mut()
        .with_context(|| format!("{} is not a JSON object", path.display()))?
        .insert(field.to_string(), Value::String(value.to_string()));
    fs::write(path, serde_json::to_string_pretty(&doc)?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Copy the two frontend helper files out of the bundle, creating parent
/// directories as needed. Best-effort per file.
pub async fn place_aux_files(workspace: &Path, bundle: &AssetBundle) {
    let template_dir = bundle.template_dir();
    let placements = [
        (
            template_dir.join("userCtx.tsx"),
            workspace.join("frontend/context/userCtx.tsx"),
        ),
        (
            template_dir.join("serverUtils.ts"),
            workspace.join("frontend/_serverActions/serverUtils.ts"),
        ),
    ];

    for (src, target) in placements {
        match place_one(&src, &target).await {
            Ok(()) => {
                let _ = cliclack::log::info(format!("Copied {}", src.display()));
            }
            Err(e) => {
                let _ = cliclack::log::warning(format!(
                    "Could not place {}: {:#}",
                    src.display(),
                    e
                ));
            }
        }
    }
}

async fn place_one(src: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fsops::copy_file(src, target).await?;
    Ok(())
}

/// Copy the remaining template tree into the workspace.
///
/// The aux files were already placed next to the frontend and are skipped
/// here. A missing source entry only skips that branch; any other I/O
/// failure aborts the run.
pub async fn organize(workspace: &Path, bundle: &AssetBundle, options: &CliOptions) -> Result<()> {
    let template_dir = bundle.template_dir();
    let mut entries = fs::read_dir(&template_dir)
        .await
        .with_context(|| format!("Failed to read {}", template_dir.display()))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to read {}", template_dir.display()))?
    {
        let name = entry.file_name();
        let src = entry.path();
        let dest = workspace.join(&name);
        let file_type = entry
            .file_type()
            .await
            .with_context(|| format!("Failed to stat {}", src.display()))?;

        let result = if file_type.is_dir() {
            fsops::copy_dir(&src, &dest).await
        } else {
            if AUX_FILES.iter().any(|aux| name.to_string_lossy() == *aux) {
                continue;
            }
            fsops::copy_file(&src, &dest).await
        };

        match result {
            Ok(()) => {}
            Err(FsError::NotFound(path)) => {
                let _ = cliclack::log::warning(format!(
                    "Skipping missing source {}",
                    path.display()
                ));
            }
            Err(e) => return Err(e).context("Asset organization failed"),
        }
    }

    if options.uses_shared_hosting() {
        remove_notifications_stack(workspace).await?;
    }

    Ok(())
}

/// Shared-domain hosting has no SNS notification stack: drop the template
/// file and the references the entry point makes to it.
async fn remove_notifications_stack(workspace: &Path) -> Result<()> {
    fsops::remove_file(&workspace.join("lib/notifications.ts"))
        .await
        .context("Failed to remove lib/notifications.ts")?;

    let entry_point = workspace.join("bin/backend.ts");
    strip_reference(&entry_point, NOTIFICATIONS_IMPORT).await?;
    strip_reference(&entry_point, NOTIFICATIONS_DEPENDENCY).await?;
    Ok(())
}

async fn strip_reference(path: &Path, needle: &str) -> Result<()> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    fs::write(path, text.replace(needle, ""))
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture_bundle(root: &Path) -> AssetBundle {
        let bundle_root = root.join("unpacked/wus-main/assets");
        std::fs::create_dir_all(bundle_root.join("template/config")).unwrap();
        std::fs::create_dir_all(bundle_root.join("template/lib")).unwrap();
        std::fs::create_dir_all(bundle_root.join("bin")).unwrap();

        std::fs::write(
            bundle_root.join("template/config/common.ts"),
            "APP_CODE: \"%APP_CODE%\"",
        )
        .unwrap();
        std::fs::write(bundle_root.join("template/lib/api.ts"), "api").unwrap();
        std::fs::write(bundle_root.join("template/userCtx.tsx"), "ctx").unwrap();
        std::fs::write(bundle_root.join("template/serverUtils.ts"), "utils").unwrap();
        std::fs::write(bundle_root.join("bin/backend.ts"), "entry").unwrap();

        AssetBundle {
            archive_path: root.join("TST.zip"),
            root: bundle_root,
        }
    }

    fn workspace_with_entry_point(root: &Path) -> PathBuf {
        let workspace = root.join("TST");
        std::fs::create_dir_all(workspace.join("bin")).unwrap();
        std::fs::create_dir_all(workspace.join("lib")).unwrap();
        std::fs::write(workspace.join("lib/notifications.ts"), "sns").unwrap();
        std::fs::write(
            workspace.join("bin/backend.ts"),
            format!(
                "{}\nconst app = new cdk.App();\n{}\n",
                NOTIFICATIONS_IMPORT, NOTIFICATIONS_DEPENDENCY
            ),
        )
        .unwrap();
        workspace
    }

    #[tokio::test]
    async fn bulk_copy_skips_aux_files() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = fixture_bundle(dir.path());
        let workspace = dir.path().join("TST");
        std::fs::create_dir_all(&workspace).unwrap();
        let options = CliOptions::new("App", "TST", "clitesting.com").unwrap();

        organize(&workspace, &bundle, &options).await.unwrap();

        assert!(workspace.join("config/common.ts").is_file());
        assert!(workspace.join("lib/api.ts").is_file());
        assert!(!workspace.join("userCtx.tsx").exists());
        assert!(!workspace.join("serverUtils.ts").exists());
    }

    #[tokio::test]
    async fn shared_hosting_drops_the_notifications_stack() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = fixture_bundle(dir.path());
        let workspace = workspace_with_entry_point(dir.path());
        let options = CliOptions::new("App", "TST", "*.amplifyapp.com").unwrap();

        organize(&workspace, &bundle, &options).await.unwrap();

        assert!(!workspace.join("lib/notifications.ts").exists());
        let entry = std::fs::read_to_string(workspace.join("bin/backend.ts")).unwrap();
        assert!(!entry.contains("NotificationStack"));
        assert!(!entry.contains("addDependency(notificationsStack"));
        assert!(entry.contains("new cdk.App()"));
    }

    #[tokio::test]
    async fn custom_domain_keeps_the_notifications_stack() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = fixture_bundle(dir.path());
        let workspace = workspace_with_entry_point(dir.path());
        let options = CliOptions::new("App", "TST", "clitesting.com").unwrap();

        organize(&workspace, &bundle, &options).await.unwrap();

        assert!(workspace.join("lib/notifications.ts").exists());
        let entry = std::fs::read_to_string(workspace.join("bin/backend.ts")).unwrap();
        assert!(entry.contains("NotificationStack"));
    }

    #[tokio::test]
    async fn aux_files_land_next_to_the_frontend() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = fixture_bundle(dir.path());
        let workspace = dir.path().join("TST");
        std::fs::create_dir_all(workspace.join("frontend")).unwrap();

        place_aux_files(&workspace, &bundle).await;

        assert!(workspace.join("frontend/context/userCtx.tsx").is_file());
        assert!(workspace
            .join("frontend/_serverActions/serverUtils.ts")
            .is_file());
    }

    #[tokio::test]
    async fn entry_scripts_replace_generated_bin() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = fixture_bundle(dir.path());
        let workspace = dir.path().join("TST");
        std::fs::create_dir_all(workspace.join("bin")).unwrap();
        std::fs::write(workspace.join("bin/tst.ts"), "generated").unwrap();
        std::fs::write(workspace.join("cdk.json"), r#"{"app": "npx ts-node bin/tst.ts"}"#).unwrap();
        std::fs::write(
            workspace.join("package.json"),
            r#"{"name": "tst", "main": "bin/tst.js"}"#,
        )
        .unwrap();

        install_entry_scripts(&workspace, &bundle).await.unwrap();

        assert!(workspace.join("bin/backend.ts").is_file());
        let cdk: Value =
            serde_json::from_str(&std::fs::read_to_string(workspace.join("cdk.json")).unwrap())
                .unwrap();
        assert_eq!(cdk["app"], ENTRY_COMMAND);
        let pkg: Value =
            serde_json::from_str(&std::fs::read_to_string(workspace.join("package.json")).unwrap())
                .unwrap();
        assert_eq!(pkg["main"], ENTRY_SCRIPT);
    }
}
