use std::{path::PathBuf, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD};
use common::{config::ServiceConfig, image_cache::EncodeOptions};
use crawler::unprotected::UnprotectedCrawler;
use metrics::{Metrics, put_metric};
use tracing::{debug, info, warn};

use crate::{
    disk_cache::DiskCache,
    errors::ImageCacheError,
    fingerprint::fingerprint,
    magick::{ImageTool, MagickTool},
    scratch::ScratchAllocator,
    traits::CacheMethod,
};

/// Outcome counts for one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub encoded: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Encoded {
    Cached { cache_key: String },
    Fresh { payload: String },
}

pub struct ImageCache {
    disk: DiskCache,
    scratch: ScratchAllocator,
    crawler: UnprotectedCrawler,
    tool: Arc<dyn ImageTool>,
}

impl ImageCache {
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_tool(config, Arc::new(MagickTool::new(config)))
    }

    pub fn with_tool(config: &ServiceConfig, tool: Arc<dyn ImageTool>) -> Self {
        Self {
            disk: DiskCache::new(&config.cache_root, &config.cache_extension),
            scratch: ScratchAllocator::new(config.scratch_dir()),
            crawler: UnprotectedCrawler::new(),
            tool,
        }
    }

    /// Creates the cache root and scratch directory if they are missing.
    pub async fn prepare(&self) -> Result<(), ImageCacheError> {
        self.disk.ensure_root().await?;
        self.scratch.ensure_dir().await
    }

    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.scratch.allocate()
    }

    /// Returns the data URI for `source`, from disk when possible.
    pub async fn encode(
        &self,
        source: &str,
        options: EncodeOptions,
    ) -> Result<String, ImageCacheError> {
        let result = match self.encode_source(source, options, "").await {
            Ok(Encoded::Cached { cache_key }) => self.disk.read(&cache_key).await,
            Ok(Encoded::Fresh { payload }) => Ok(payload),
            Err(err) => Err(err),
        };

        if result.is_err() {
            put_metric!(Metrics::EncodeFailure, 1);
        }

        result
    }

    /// Runs every source through the pipeline. A failing source is logged
    /// and the loop moves on, cached sources are not read back.
    pub async fn encode_batch(&self, sources: &[String], options: EncodeOptions) -> BatchReport {
        let mut report = BatchReport::default();

        for source in sources {
            match self.encode_source(source, options, "[Batch] ").await {
                Ok(Encoded::Cached { .. }) => report.skipped += 1,
                Ok(Encoded::Fresh { .. }) => report.encoded += 1,
                Err(err) => {
                    put_metric!(Metrics::EncodeFailure, 1);
                    warn!("[Batch] {}: {}", source, err);
                    report.failed += 1;
                }
            }
        }

        info!(
            "[Batch] {} encoded, {} already cached, {} failed",
            report.encoded, report.skipped, report.failed
        );

        report
    }

    async fn encode_source(
        &self,
        source: &str,
        options: EncodeOptions,
        log_prefix: &str,
    ) -> Result<Encoded, ImageCacheError> {
        let source = decode_source(source)?;
        let cache_key = fingerprint(&source, options.resize, options.width);

        debug!("{log_prefix}{cache_key}");

        if !options.force && self.disk.has(&cache_key).await {
            info!("{log_prefix}Retrieving from local cache");
            put_metric!(Metrics::CacheHit, 1);

            return Ok(Encoded::Cached { cache_key });
        }

        put_metric!(Metrics::CacheMiss, 1);
        info!("{log_prefix}Retrieving from remote {source}");

        // removed on drop if anything below bails out
        let scratch = self.scratch.acquire();

        self.crawler.download_to(&source, scratch.path()).await?;

        let mime = self.tool.identify(scratch.path()).await?;

        if let Some(width) = options.resize_width() {
            info!("{log_prefix}Resizing (width {width}): {source}");
            self.tool.resize(scratch.path(), width).await?;
        }

        let bytes = tokio::fs::read(scratch.path())
            .await
            .map_err(|err| ImageCacheError::Scratch {
                path: scratch.path().to_path_buf(),
                source: err,
            })?;

        let payload = format!("data:{mime};base64,{}", STANDARD.encode(bytes));

        self.disk.write(&cache_key, &payload).await?;

        // the entry is already on disk, a leftover scratch file is not worth failing over
        if let Err(err) = scratch.release().await {
            warn!("{log_prefix}{err}");
        }

        Ok(Encoded::Fresh { payload })
    }
}

fn decode_source(source: &str) -> Result<String, ImageCacheError> {
    urlencoding::decode(source)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ImageCacheError::Decode(source.to_string()))
}
