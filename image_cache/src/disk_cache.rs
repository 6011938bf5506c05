use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::debug;

use crate::{errors::ImageCacheError, traits::CacheMethod};

/// Flat directory of `<key>.<extension>` files, each holding one data URI.
///
/// Writes replace the whole file but are not atomic: a crash halfway through
/// leaves a truncated entry behind, and that entry is served as-is by later
/// lookups until a forced request rewrites it. There is no eviction and no
/// locking, two requests racing on the same key both write and the last one
/// wins.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
    extension: String,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<(), ImageCacheError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(ImageCacheError::CacheIo)
    }

    pub fn entry_path(&self, cache_key: &str) -> PathBuf {
        self.root.join(format!("{cache_key}.{}", self.extension))
    }
}

impl CacheMethod for DiskCache {
    async fn has(&self, cache_key: &str) -> bool {
        fs::try_exists(self.entry_path(cache_key))
            .await
            .unwrap_or(false)
    }

    async fn read(&self, cache_key: &str) -> Result<String, ImageCacheError> {
        match fs::read_to_string(self.entry_path(cache_key)).await {
            Ok(payload) => Ok(payload),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(ImageCacheError::CacheEntryNotFound(cache_key.to_string()))
            }
            Err(err) => Err(ImageCacheError::CacheIo(err)),
        }
    }

    async fn write(&self, cache_key: &str, payload: &str) -> Result<(), ImageCacheError> {
        let path = self.entry_path(cache_key);

        debug!("Writing {} bytes to {}", payload.len(), path.display());

        fs::write(path, payload)
            .await
            .map_err(ImageCacheError::CacheIo)
    }
}
