use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::SourceConfig;
use crate::extract::SourceDocument;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid fetcher configuration: {0}")]
    Config(String),
}

/// Outbound collaborator that retrieves the raw stock page. Behind a trait so
/// refresh cycles can be driven by scripted documents in tests.
#[async_trait]
pub trait StockFetcher: Send + Sync {
    async fn fetch(&self) -> Result<SourceDocument, FetchError>;
}

/// Plain HTTP fetcher. Timeout and user agent live on the client, so a hung
/// fetch surfaces as a [`FetchError`] and bounds cycle latency.
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout_secs: config.request_timeout,
        })
    }
}

#[async_trait]
impl StockFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<SourceDocument, FetchError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_secs)
            } else {
                FetchError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.bytes().await?;
        Ok(SourceDocument::from_bytes(body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source_config(url: &str) -> SourceConfig {
        SourceConfig {
            url: url.to_string(),
            user_agent: "TestAgent/1.0".to_string(),
            request_timeout: 5,
        }
    }

    #[test]
    fn test_fetcher_creation() {
        let fetcher = HttpFetcher::new(&test_source_config("http://localhost:1/stock"));
        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_connection_error_is_a_fetch_error() {
        // Port 1 is never listening.
        let fetcher = HttpFetcher::new(&test_source_config("http://127.0.0.1:1/stock")).unwrap();
        let result = fetcher.fetch().await;
        assert!(matches!(
            result,
            Err(FetchError::Request(_)) | Err(FetchError::Timeout(_))
        ));
    }
}
