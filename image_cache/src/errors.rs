use std::{io, path::PathBuf};

use crawler::errors::CrawlerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageCacheError {
    #[error("Failed to decode source {0}")]
    Decode(String),
    #[error(transparent)]
    Fetch(#[from] CrawlerError),
    #[error("Unsupported image type")]
    UnsupportedImageType,
    // stderr is passed through untouched
    #[error("{0}")]
    ExternalTool(String),
    #[error("Failed to launch {command}: {source}")]
    ToolLaunch {
        command: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cache entry {0} does not exist")]
    CacheEntryNotFound(String),
    #[error("Cache I/O failed: {0}")]
    CacheIo(#[source] io::Error),
    #[error("Scratch file {path} failed: {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
