use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("Failed to retrieve {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Remote responded with {status} for {url}")]
    UnsuccessfulStatus { url: String, status: StatusCode },
    #[error("Failed to write downloaded file: {0}")]
    WriteFailed(#[from] std::io::Error),
}
