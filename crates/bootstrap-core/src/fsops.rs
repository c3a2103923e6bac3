//! Recursive file and directory operations over tokio::fs
//!
//! Failures are split into [`FsError::NotFound`] (the caller may skip that
//! branch and continue) and [`FsError::Io`] (the caller aborts the run).

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use thiserror::Error;
use tokio::fs;

/// Filesystem failure with the path that caused it.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("source path not found: {0}")]
    NotFound(PathBuf),

    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Byte-for-byte copy of a single file. A missing source surfaces as
/// [`FsError::NotFound`].
pub async fn copy_file(src: &Path, dest: &Path) -> Result<(), FsError> {
    fs::copy(src, dest)
        .await
        .map(|_| ())
        .map_err(|e| FsError::from_io(src, e))
}

/// Create `dest` and copy every entry of `src` into it, depth first.
///
/// Every child copy is awaited before the next entry starts, so the whole
/// tree is on disk when this returns.
pub fn copy_dir<'a>(
    src: &'a Path,
    dest: &'a Path,
) -> Pin<Box<dyn Future<Output = Result<(), FsError>> + Send + 'a>> {
    Box::pin(async move {
        fs::create_dir_all(dest)
            .await
            .map_err(|e| FsError::from_io(dest, e))?;

        let mut entries = fs::read_dir(src)
            .await
            .map_err(|e| FsError::from_io(src, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FsError::from_io(src, e))?
        {
            let src_entry = entry.path();
            let dest_entry = dest.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| FsError::from_io(&src_entry, e))?;

            if file_type.is_dir() {
                copy_dir(&src_entry, &dest_entry).await?;
            } else {
                copy_file(&src_entry, &dest_entry).await?;
            }
        }

        Ok(())
    })
}

/// Recursive delete. An already-absent target counts as success so cleanup
/// passes can run unconditionally.
pub async fn remove_dir(path: &Path) -> Result<(), FsError> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FsError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Delete a single file; absent targets count as success.
pub async fn remove_file(path: &Path) -> Result<(), FsError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FsError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copy_file_missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = copy_file(&dir.path().join("missing.txt"), &dir.path().join("out.txt")).await;
        assert!(matches!(result, Err(FsError::NotFound(_))));
    }

    #[tokio::test]
    async fn copy_dir_copies_every_file_at_matching_paths() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");

        std::fs::create_dir_all(src.join("a/b")).unwrap();
        std::fs::write(src.join("root.txt"), b"root").unwrap();
        std::fs::write(src.join("a/one.txt"), b"one").unwrap();
        std::fs::write(src.join("a/b/two.txt"), b"two").unwrap();

        copy_dir(&src, &dest).await.unwrap();

        assert_eq!(std::fs::read(dest.join("root.txt")).unwrap(), b"root");
        assert_eq!(std::fs::read(dest.join("a/one.txt")).unwrap(), b"one");
        assert_eq!(std::fs::read(dest.join("a/b/two.txt")).unwrap(), b"two");
    }

    #[tokio::test]
    async fn copy_dir_tolerates_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(src.join("f.txt"), b"x").unwrap();

        copy_dir(&src, &dest).await.unwrap();
        assert!(dest.join("f.txt").exists());
    }

    #[tokio::test]
    async fn remove_absent_targets_is_success() {
        let dir = tempfile::tempdir().unwrap();
        remove_dir(&dir.path().join("nope")).await.unwrap();
        remove_file(&dir.path().join("nope.txt")).await.unwrap();
    }
}
