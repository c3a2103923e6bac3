//! Asset bundle download and extraction
//!
//! The bundle is a repository zip: a single top-level folder wrapping an
//! `assets/` tree with the `template/` and `bin/` payloads. It is downloaded
//! into the workspace, extracted into a uniquely-named directory (the app
//! code prefix keeps concurrent runs for different apps from colliding), and
//! consumed read-only from there until SupportCleanup removes both again.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;
use zip::ZipArchive;

use crate::fsops;
use crate::product::StackConfig;

/// A downloaded and extracted asset bundle.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    /// The archive as downloaded, `<workspace>/<app_code>.zip`
    pub archive_path: PathBuf,
    /// `<extraction dir>/<archive root folder>/assets`
    pub root: PathBuf,
}

impl AssetBundle {
    /// The template payload copied into the workspace during AssetOrganize.
    pub fn template_dir(&self) -> PathBuf {
        self.root.join("template")
    }

    /// The replacement entry scripts copied over the generated `bin/`.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }
}

/// Downloads the product's asset bundle into a workspace.
pub struct AssetFetcher {
    url: Url,
    client: reqwest::Client,
}

impl AssetFetcher {
    pub fn new(url: Url, user_agent: &str) -> Self {
        Self {
            url,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Create a fetcher from a product config, honoring the env-var override.
    pub fn from_config<C: StackConfig>(config: &C) -> Result<Self> {
        let url_str = std::env::var(config.asset_url_env())
            .unwrap_or_else(|_| config.asset_bundle_url().to_string());
        let url = Url::parse(&url_str)
            .with_context(|| format!("Invalid asset bundle URL: {}", url_str))?;
        Ok(Self::new(url, config.user_agent()))
    }

    /// Download the archive to `<workspace>/<app_code>.zip` and extract it.
    pub async fn fetch(&self, workspace: &Path, app_code: &str) -> Result<AssetBundle> {
        let archive_path = workspace.join(format!("{}.zip", app_code));

        if let Err(e) = self.download(&archive_path).await {
            // Don't leave a truncated archive behind for the next run to trip on.
            let _ = fsops::remove_file(&archive_path).await;
            return Err(e);
        }

        unpack(&archive_path, workspace, app_code)
    }

    async fn download(&self, dest: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to download asset bundle from {}", self.url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to download asset bundle from {}: HTTP {}",
                self.url,
                response.status()
            );
        }

        let mut file = fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        while let Some(chunk) = response.chunk().await.context("Download interrupted")? {
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write {}", dest.display()))?;
        }
        file.flush()
            .await
            .with_context(|| format!("Failed to flush {}", dest.display()))?;

        Ok(())
    }
}

/// Extract an already-downloaded archive into a fresh `<app_code>-assets-*`
/// directory inside the workspace and locate the usable asset root.
pub fn unpack(archive_path: &Path, workspace: &Path, app_code: &str) -> Result<AssetBundle> {
    let extract_dir = tempfile::Builder::new()
        .prefix(&format!("{}-assets-", app_code))
        .tempdir_in(workspace)
        .with_context(|| format!("Failed to create extraction directory in {}", workspace.display()))?
        .keep();

    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read archive {}", archive_path.display()))?;
    archive.extract(&extract_dir).with_context(|| {
        format!(
            "Failed to extract {} into {}",
            archive_path.display(),
            extract_dir.display()
        )
    })?;

    let root = archive_root(&extract_dir)?;
    Ok(AssetBundle {
        archive_path: archive_path.to_path_buf(),
        root: root.join("assets"),
    })
}

/// Repository zips wrap everything in one top-level folder; fall back to the
/// extraction dir itself when the archive had no wrapper.
fn archive_root(extract_dir: &Path) -> Result<PathBuf> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(extract_dir)
        .with_context(|| format!("Failed to read {}", extract_dir.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to read {}", extract_dir.display()))?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        }
    }

    match dirs.as_slice() {
        [single] => Ok(single.clone()),
        _ => Ok(extract_dir.to_path_buf()),
    }
}
