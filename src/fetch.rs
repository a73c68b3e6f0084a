use std::time::Duration;

use bytes::Bytes;
use rand::Rng;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("HTTP {status} for {url}")] Status { url: String, status: StatusCode },
    #[error("Other: {0}")] Other(String),
}

impl FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(_) => true,
            FetchError::Status { status, .. } => status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS,
            FetchError::Other(_) => false,
        }
    }
}

/// Body of a successful GET plus its declared content type.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Shared HTTP client for templates and images: one timeout, bounded retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    retries: u32,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retries: u32) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Other(e.to_string()))?;
        Ok(Self { client, retries })
    }

    pub async fn get(&self, url: &str) -> Result<Fetched, FetchError> {
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if attempt < self.retries && e.is_retryable() => {
                    attempt += 1;
                    let backoff = 200 * u64::from(attempt) + rand::thread_rng().gen_range(0..100);
                    warn!("🔄 Fetch of {} failed ({}), retry {}/{} in {}ms", url, e, attempt, self.retries, backoff);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<Fetched, FetchError> {
        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response.bytes().await.map_err(|e| FetchError::Http(e.to_string()))?;

        info!("📥 {} -> {} bytes ({})", url, bytes.len(), content_type.as_deref().unwrap_or("no content type"));
        Ok(Fetched { bytes, content_type })
    }
}
