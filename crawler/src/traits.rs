use reqwest::StatusCode;

pub struct CrawlerResponse {
    pub status: StatusCode,
    pub raw_bytes: Vec<u8>,
}

impl CrawlerResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
