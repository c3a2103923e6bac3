//! The init flow - a strictly sequential state machine
//!
//! Every stage is awaited to completion before the next begins. A fatal
//! stage returns an error that the binary turns into a non-zero exit;
//! best-effort stages log and continue. There is no rollback: a partially
//! initialized workspace stays on disk, and the next run wipes it (see
//! [`crate::workspace::prepare`]).

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::assets::AssetFetcher;
use crate::fsops;
use crate::manifest;
use crate::net;
use crate::options::CliOptions;
use crate::process::{git, npm, runner};
use crate::product::StackConfig;
use crate::templates::{organize, substitute};
use crate::workspace;

/// Arguments for one init run.
#[derive(Debug, Clone)]
pub struct InitArgs {
    pub options: CliOptions,

    /// Skip the confirmation prompt before wiping an existing workspace.
    pub yes: bool,
}

/// Run the whole init flow for `config` with the given options.
pub async fn run<C: StackConfig>(config: &C, args: InitArgs) -> Result<()> {
    let options = &args.options;
    cliclack::intro(config.display_name())?;

    // Fast-fail gate: nothing below works offline.
    let spinner = cliclack::spinner();
    spinner.start("Checking network access...");
    match net::check_reachable(config.connectivity_probe_url(), config.user_agent()).await {
        Ok(()) => spinner.stop("Network reachable"),
        Err(e) => {
            spinner.stop("Network unreachable");
            return Err(e.context("Aborting: network check failed"));
        }
    }

    cliclack::log::info(format!(
        "Initializing application...\n  AppCode: {}\n  AppName: {}\n  DomainName: {}",
        options.app_code, options.app_name, options.domain_name
    ))?;

    let workspace_dir = std::env::current_dir()
        .context("Cannot resolve the current directory")?
        .join(&options.app_code);
    let assume_yes = args.yes;
    workspace::prepare(&workspace_dir, |path| {
        if assume_yes {
            return true;
        }
        cliclack::confirm(format!(
            "{} already exists and will be wiped. Continue?",
            path.display()
        ))
        .initial_value(true)
        .interact()
        .unwrap_or(false)
    })
    .await
    .context("Aborting: workspace preparation failed")?;

    let rules = config.prompt_rules();

    // Infrastructure generator
    let spinner = cliclack::spinner();
    spinner.start("Generating the CDK app...");
    let result = runner::run(
        "npx",
        &[
            "aws-cdk",
            "init",
            "app",
            "--generate-only",
            "--language",
            "typescript",
        ],
        &workspace_dir,
        &rules,
    )
    .await?;
    if !result.success {
        spinner.stop("CDK init failed");
        cliclack::log::error(result.stderr.trim())?;
        anyhow::bail!(
            "Aborting: the infrastructure generator exited with code {}",
            result.exit_code
        );
    }
    spinner.stop("CDK app generated");

    // Remote assets
    let spinner = cliclack::spinner();
    spinner.start("Fetching the asset bundle...");
    let fetcher = AssetFetcher::from_config(config)?;
    let bundle = match fetcher.fetch(&workspace_dir, &options.app_code).await {
        Ok(bundle) => {
            spinner.stop("Assets ready");
            bundle
        }
        Err(e) => {
            spinner.stop("Asset fetch failed");
            return Err(e.context("Aborting: asset fetch failed"));
        }
    };

    // Entry scripts. Best-effort: the generated defaults still run if the
    // patch does not land.
    match organize::install_entry_scripts(&workspace_dir, &bundle).await {
        Ok(()) => cliclack::log::success("CDK entry scripts installed")?,
        Err(e) => cliclack::log::warning(format!("Entry script patch skipped: {:#}", e))?,
    }

    // Frontend generator
    let spinner = cliclack::spinner();
    spinner.start("Working on the frontend...");
    let result = runner::run(
        "npx",
        &[
            "create-next-app@latest",
            "frontend",
            "-e",
            config.frontend_template_repo(),
            "--typescript",
            "--eslint",
            "--tailwind",
            "--src-dir",
            "--app",
        ],
        &workspace_dir,
        &rules,
    )
    .await?;
    if !result.success {
        spinner.stop("Frontend generator failed");
        cliclack::log::error(result.stderr.trim())?;
        anyhow::bail!(
            "Aborting: the frontend generator exited with code {}",
            result.exit_code
        );
    }
    spinner.stop("Frontend created");
    organize::place_aux_files(&workspace_dir, &bundle).await;

    // Template payload and placeholder substitution
    organize::organize(&workspace_dir, &bundle, options)
        .await
        .context("Aborting: asset organization failed")?;
    cliclack::log::info("Find + replace on config files...")?;
    substitute::substitute(&workspace_dir, options)
        .await
        .context("Aborting: template substitution failed")?;

    // Manifests
    manifest::patch_infra(&workspace_dir, &options.app_code)
        .await
        .context("Aborting: infrastructure manifest patch failed")?;
    manifest::patch_frontend(&workspace_dir, &options.app_code)
        .await
        .context("Aborting: frontend manifest patch failed")?;
    cliclack::log::success("package.json files updated")?;

    // Dependencies. Best-effort: the user can re-run npm install by hand.
    cliclack::log::info("Installing dependencies...")?;
    npm::install(&workspace_dir.join("frontend"), None, &rules).await;
    npm::install(&workspace_dir, None, &rules).await;

    cleanup_support_files(&workspace_dir, &options.app_code).await;

    git::init(&workspace_dir).await;

    print_next_steps(config, &workspace_dir)?;
    Ok(())
}

/// Remove generator leftovers: the stub stack, the unpacked asset directory
/// and the downloaded archive. Best-effort; everything here is disposable.
async fn cleanup_support_files(workspace: &Path, app_code: &str) {
    let stub_stack = workspace
        .join("lib")
        .join(format!("{}-stack.ts", app_code.to_lowercase()));
    if let Err(e) = fsops::remove_file(&stub_stack).await {
        let _ = cliclack::log::warning(format!(
            "Could not remove {}: {}",
            stub_stack.display(),
            e
        ));
    }

    let assets_prefix = format!("{}-assets-", app_code);
    let archive_name = format!("{}.zip", app_code);
    let mut entries = match tokio::fs::read_dir(workspace).await {
        Ok(entries) => entries,
        Err(e) => {
            let _ = cliclack::log::warning(format!("Support cleanup skipped: {}", e));
            return;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        let result = if name.starts_with(&assets_prefix) {
            fsops::remove_dir(&entry.path()).await
        } else if name == archive_name {
            fsops::remove_file(&entry.path()).await
        } else {
            continue;
        };
        if let Err(e) = result {
            let _ = cliclack::log::warning(format!("Could not remove {}: {}", name, e));
        }
    }
}

fn print_next_steps<C: StackConfig>(config: &C, workspace: &Path) -> Result<()> {
    println!();
    println!("  {}", "Next steps".cyan().bold());
    println!();
    for (i, step) in config.next_steps(workspace).iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }
    cliclack::outro("All done! Start building your Serverless (AppSync) + NextJS SaaS.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cleanup_removes_support_files_and_nothing_else() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path();
        std::fs::create_dir_all(workspace.join("lib")).unwrap();
        std::fs::create_dir_all(workspace.join("TST-assets-x7f2")).unwrap();
        std::fs::write(workspace.join("TST-assets-x7f2/file.ts"), "x").unwrap();
        std::fs::write(workspace.join("TST.zip"), "archive").unwrap();
        std::fs::write(workspace.join("lib/tst-stack.ts"), "stub").unwrap();
        std::fs::write(workspace.join("lib/api.ts"), "keep").unwrap();
        std::fs::write(workspace.join("package.json"), "{}").unwrap();

        cleanup_support_files(workspace, "TST").await;

        assert!(!workspace.join("TST-assets-x7f2").exists());
        assert!(!workspace.join("TST.zip").exists());
        assert!(!workspace.join("lib/tst-stack.ts").exists());
        assert!(workspace.join("lib/api.ts").exists());
        assert!(workspace.join("package.json").exists());
    }

    #[tokio::test]
    async fn cleanup_is_quiet_when_nothing_is_left() {
        let dir = tempfile::tempdir().unwrap();
        cleanup_support_files(dir.path(), "TST").await;
    }
}
