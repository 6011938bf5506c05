mod routes;
mod service_layers;

use std::sync::Arc;

use clap::Parser;
use common::config::ServiceConfig;
use image_cache::ImageCache;
use mimalloc::MiMalloc;
use tokio::{net::TcpListener, signal};
use tracing::info;
use utils::logger::configure_logger;

use crate::routes::build_router;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub(crate) struct ServerState {
    pub(crate) image_cache: ImageCache,
}

#[tokio::main]
async fn main() {
    configure_logger();

    let config = ServiceConfig::parse();

    if config.metrics {
        metrics::enable();
    }

    let image_cache = ImageCache::new(&config);

    image_cache
        .prepare()
        .await
        .expect("Cache and scratch directories to be writable");

    info!(
        "Caching into {} ({} tool runs at once)",
        config.cache_root.display(),
        config.max_concurrent_tools
    );

    let state = Arc::new(ServerState { image_cache });
    let router = build_router(state, &config.route_prefix);

    let listener = TcpListener::bind(config.listen)
        .await
        .expect("Listen address to be available");

    info!("Listening on {}{}", config.listen, config.route_prefix);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server to shut down cleanly");
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }

    info!("Shutting down");
}
