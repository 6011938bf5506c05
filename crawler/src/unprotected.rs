use std::{path::Path, sync::OnceLock};

use reqwest::{Client, ClientBuilder};
use tracing::{debug, info};

use crate::{errors::CrawlerError, request::Request, traits::CrawlerResponse};

const USER_AGENT: &str = concat!("image-encoder/", env!("CARGO_PKG_VERSION"));

static REQWEST_CLIENT: OnceLock<Client> = OnceLock::new();

/// Plain GET fetcher: one attempt, no retries, transport default timeouts.
#[derive(Copy, Clone, Default)]
pub struct UnprotectedCrawler {}

impl UnprotectedCrawler {
    pub fn new() -> Self {
        Self {}
    }

    fn create_client() -> &'static Client {
        REQWEST_CLIENT.get_or_init(|| {
            ClientBuilder::new()
                .gzip(true)
                .user_agent(USER_AGENT)
                .build()
                .expect("Valid base reqwest to be built")
        })
    }

    pub async fn make_web_request(
        &self,
        request: Request,
    ) -> Result<CrawlerResponse, CrawlerError> {
        let client = Self::create_client();

        let request_builder = client.get(request.url.clone());

        info!("Sending request to {}", request.url);

        let transport_error = |source| CrawlerError::Transport {
            url: request.url.clone(),
            source,
        };

        let response = request_builder.send().await.map_err(transport_error)?;

        debug!("Status {} for {}", response.status(), request.url);

        let status = response.status();
        let raw_bytes = response.bytes().await.map_err(transport_error)?.to_vec();

        Ok(CrawlerResponse { status, raw_bytes })
    }

    /// Downloads `url` into `path`, replacing whatever the file held before.
    /// A non-2xx answer is an error and leaves `path` untouched.
    pub async fn download_to(&self, url: &str, path: &Path) -> Result<usize, CrawlerError> {
        let request = Request::builder().set_url(url).build();
        let response = self.make_web_request(request).await?;

        if !response.is_success() {
            return Err(CrawlerError::UnsuccessfulStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        tokio::fs::write(path, &response.raw_bytes).await?;

        Ok(response.raw_bytes.len())
    }
}
