mod encode;
pub(crate) mod error_message_erasure;
mod hello;
mod path;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    ServerState,
    routes::{
        encode::{batch_handler, encode_handler},
        hello::hello_handler,
        path::path_handler,
    },
    service_layers::build_service_layers,
};

pub(crate) fn build_router(state: Arc<ServerState>, route_prefix: &str) -> Router {
    let routes = Router::new()
        .route("/hello", get(hello_handler))
        .route("/encode", get(encode_handler))
        .route("/encode/batch", post(batch_handler))
        .route("/path", get(path_handler));

    let prefix = route_prefix.trim_matches('/');

    let router = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&format!("/{prefix}"), routes)
    };

    router.layer(build_service_layers()).with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
        routing::get,
    };
    use common::{config::ServiceConfig, mime::MimeType};
    use image_cache::{ImageCache, ImageCacheError, fingerprint::fingerprint, magick::ImageTool};
    use tempfile::TempDir;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    use super::build_router;
    use crate::ServerState;

    const PREFIX: &str = "/api/v2/images";

    struct PngTool {
        identify_calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageTool for PngTool {
        async fn identify(&self, path: &Path) -> Result<MimeType, ImageCacheError> {
            self.identify_calls.fetch_add(1, Ordering::SeqCst);

            if path.exists() {
                Ok(MimeType::Png)
            } else {
                Err(ImageCacheError::UnsupportedImageType)
            }
        }

        async fn resize(&self, path: &Path, width: u16) -> Result<(), ImageCacheError> {
            tokio::fs::write(path, format!("resized-{width}"))
                .await
                .map_err(ImageCacheError::CacheIo)
        }
    }

    struct TestApp {
        dir: TempDir,
        tool: Arc<PngTool>,
        router: Router,
        origin: String,
    }

    impl TestApp {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = ServiceConfig {
                cache_root: dir.path().join("cache"),
                scratch_dir: Some(dir.path().join("scratch")),
                ..Default::default()
            };
            let tool = Arc::new(PngTool {
                identify_calls: AtomicUsize::new(0),
            });
            let image_cache = ImageCache::with_tool(&config, tool.clone());
            image_cache.prepare().await.unwrap();

            let router = build_router(Arc::new(ServerState { image_cache }), PREFIX);

            Self {
                dir,
                tool,
                router,
                origin: spawn_origin().await,
            }
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        fn cache_entries(&self) -> usize {
            std::fs::read_dir(self.dir.path().join("cache"))
                .unwrap()
                .count()
        }
    }

    async fn spawn_origin() -> String {
        let router = Router::new()
            .route("/a.png", get(|| async { &b"png-bytes"[..] }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{addr}")
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn encode_uri(source: &str, extra: &str) -> String {
        format!(
            "{PREFIX}/encode?source={}{extra}",
            urlencoding::encode(source)
        )
    }

    #[tokio::test]
    async fn hello() {
        let app = TestApp::new().await;

        let response = app.get(&format!("{PREFIX}/hello")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Hello");
    }

    #[tokio::test]
    async fn routes_live_under_prefix() {
        let app = TestApp::new().await;

        let response = app.get("/hello").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn encode_returns_data_uri_and_caches_it() {
        let app = TestApp::new().await;
        let source = format!("{}/a.png", app.origin);

        let response = app.get(&encode_uri(&source, "&resize=True&width=100")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );

        let body = body_text(response).await;
        assert_eq!(body, "data:image/png;base64,cmVzaXplZC0xMDA=");

        let entry = app
            .dir
            .path()
            .join("cache")
            .join(format!("{}.base64", fingerprint(&source, true, 100)));
        assert_eq!(std::fs::read_to_string(entry).unwrap(), body);
    }

    #[tokio::test]
    async fn repeated_encode_is_identical_and_skips_the_pipeline() {
        let app = TestApp::new().await;
        let uri = encode_uri(&format!("{}/a.png", app.origin), "");

        let first = body_text(app.get(&uri).await).await;
        let second = body_text(app.get(&uri).await).await;

        assert_eq!(first, "data:image/png;base64,cG5nLWJ5dGVz");
        assert_eq!(first, second);
        assert_eq!(app.tool.identify_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn encode_failure_is_500_with_message() {
        let app = TestApp::new().await;

        let response = app
            .get(&encode_uri(&format!("{}/missing", app.origin), ""))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("404"));
        assert_eq!(app.cache_entries(), 0);
    }

    #[tokio::test]
    async fn encode_without_source_is_bad_request() {
        let app = TestApp::new().await;

        let missing = app.get(&format!("{PREFIX}/encode?resize=true")).await;
        let bad_width = app
            .get(&encode_uri(&format!("{}/a.png", app.origin), "&width=-1"))
            .await;

        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad_width.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn encode_ignores_cache_buster_parameter() {
        let app = TestApp::new().await;

        let response = app
            .get(&encode_uri(&format!("{}/a.png", app.origin), "&_=1697500000"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn batch_always_acknowledges() {
        let app = TestApp::new().await;
        let valid = format!("{}/a.png", app.origin);
        let sources = vec![valid.clone(), format!("{}/missing", app.origin)];

        let request = Request::post(format!("{PREFIX}/encode/batch?resize&width&force"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&sources).unwrap()))
            .unwrap();

        let response = app.send(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.cache_entries(), 1);
        assert!(
            app.dir
                .path()
                .join("cache")
                .join(format!("{}.base64", fingerprint(&valid, false, 0)))
                .is_file()
        );
    }

    #[tokio::test]
    async fn batch_rejects_non_array_body() {
        let app = TestApp::new().await;

        let request = Request::post(format!("{PREFIX}/encode/batch"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"source":"x"}"#))
            .unwrap();

        assert_eq!(app.send(request).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn path_points_into_scratch_dir() {
        let app = TestApp::new().await;

        let response = app.get(&format!("{PREFIX}/path")).await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        let scratch_dir = app.dir.path().join("scratch");
        assert!(body.starts_with(&scratch_dir.display().to_string()));
        assert_ne!(body, body_text(app.get(&format!("{PREFIX}/path")).await).await);
    }
}
