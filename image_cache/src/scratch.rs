use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ImageCacheError;

/// Hands out unique, extension-less paths inside the scratch directory.
#[derive(Debug, Clone)]
pub struct ScratchAllocator {
    dir: PathBuf,
}

impl ScratchAllocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn ensure_dir(&self) -> Result<(), ImageCacheError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ImageCacheError::Scratch {
                path: self.dir.clone(),
                source,
            })
    }

    /// A fresh path, nothing is created on disk.
    pub fn allocate(&self) -> PathBuf {
        self.dir.join(Uuid::new_v4().to_string())
    }

    /// Path wrapped in a guard that removes the file when dropped.
    pub fn acquire(&self) -> ScratchFile {
        ScratchFile {
            path: self.allocate(),
            armed: true,
        }
    }

    pub async fn release(path: &Path) -> Result<(), ImageCacheError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|source| ImageCacheError::Scratch {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Owns one scratch path for the duration of a request.
///
/// Call [`ScratchFile::release`] on the happy path to see deletion errors.
/// Any other exit (early return, `?`, panic) deletes the file on drop, where a
/// file that was never written is not an error.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    armed: bool,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn release(mut self) -> Result<(), ImageCacheError> {
        self.armed = false;

        ScratchAllocator::release(&self.path).await
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        // failure-path fallback only; successful encodes go through the async `release`
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed scratch file {}", self.path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                "Failed to remove scratch file {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}
