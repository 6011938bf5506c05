use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use common::mime::MimeType;
use tokio::net::TcpListener;

use crate::{errors::ImageCacheError, magick::ImageTool};

pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);

    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    path
}

/// Stand-in for ImageMagick that keeps count of what it was asked to do.
#[derive(Default)]
pub(crate) struct FakeTool {
    pub(crate) format: Option<MimeType>,
    pub(crate) resize_error: Option<String>,
    pub(crate) identify_calls: AtomicUsize,
    pub(crate) resize_calls: Mutex<Vec<u16>>,
}

impl FakeTool {
    pub(crate) fn identifying(format: MimeType) -> Self {
        Self {
            format: Some(format),
            ..Default::default()
        }
    }

    pub(crate) fn identify_count(&self) -> usize {
        self.identify_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn resized_widths(&self) -> Vec<u16> {
        self.resize_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageTool for FakeTool {
    async fn identify(&self, path: &Path) -> Result<MimeType, ImageCacheError> {
        self.identify_calls.fetch_add(1, Ordering::SeqCst);

        // a missing file prints nothing, same as the real thing
        if !path.exists() {
            return Err(ImageCacheError::UnsupportedImageType);
        }

        self.format.ok_or(ImageCacheError::UnsupportedImageType)
    }

    async fn resize(&self, path: &Path, width: u16) -> Result<(), ImageCacheError> {
        self.resize_calls.lock().unwrap().push(width);

        if let Some(message) = &self.resize_error {
            return Err(ImageCacheError::ExternalTool(message.clone()));
        }

        std::fs::write(path, format!("resized-{width}")).unwrap();

        Ok(())
    }
}

/// Local HTTP origin. `/a.png` answers `image-<n>` where n counts the hits,
/// `/missing` is a 404.
pub(crate) async fn spawn_origin() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));

    let router = Router::new()
        .route(
            "/a.png",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                let hit = hits.fetch_add(1, Ordering::SeqCst) + 1;
                format!("image-{hit}").into_bytes()
            }),
        )
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}"), hits)
}
