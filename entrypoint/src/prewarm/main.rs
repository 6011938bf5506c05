use std::path::PathBuf;

use clap::Parser;
use common::{config::ServiceConfig, image_cache::EncodeOptions};
use image_cache::ImageCache;
use tracing::{error, info};
use utils::logger::configure_logger;

/// Fills the disk cache ahead of time, same pipeline as the batch endpoint.
#[derive(Debug, Parser)]
struct PrewarmArgs {
    #[command(flatten)]
    config: ServiceConfig,

    #[arg(long)]
    resize: bool,

    #[arg(long, default_value_t = 0)]
    width: u16,

    #[arg(long)]
    force: bool,

    /// Newline separated list of sources, `#` starts a comment
    #[arg(long)]
    file: Option<PathBuf>,

    sources: Vec<String>,
}

fn parse_source_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[tokio::main]
async fn main() {
    configure_logger();

    let args = PrewarmArgs::parse();
    let mut sources = args.sources.clone();

    if let Some(file) = &args.file {
        match tokio::fs::read_to_string(file).await {
            Ok(contents) => sources.extend(parse_source_list(&contents)),
            Err(err) => {
                error!("Failed to read {}: {}", file.display(), err);
                std::process::exit(1);
            }
        }
    }

    if args.config.metrics {
        metrics::enable();
    }

    let image_cache = ImageCache::new(&args.config);

    if let Err(err) = image_cache.prepare().await {
        error!("{}", err);
        std::process::exit(1);
    }

    let options = EncodeOptions::new(args.resize, args.width, args.force);
    let report = image_cache.encode_batch(&sources, options).await;

    info!(
        "Prewarmed {} into {} ({} encoded, {} cached, {} failed)",
        sources.len(),
        image_cache.disk().root().display(),
        report.encoded,
        report.skipped,
        report.failed
    );
}
