//! HTTP page transport
//!
//! This module issues the actual page requests:
//! - Building the HTTP client with timeout, user agent and forward proxy
//! - Rewriting the target URL for the selected proxy strategy
//! - Classifying failures into [`TransportError`]
//!
//! Content validity is not judged here; a 200 carrying a block page is a
//! successful transport call.

use crate::config::FetcherConfig;
use crate::proxy::ProxyStrategy;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Network or HTTP-level failure of a single request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
}

/// Fetches the raw content of one page
#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// Builds an HTTP client for the given fetcher settings and strategy
///
/// # Example
///
/// ```no_run
/// use landwatch_harvest::config::FetcherConfig;
/// use landwatch_harvest::crawler::build_http_client;
/// use landwatch_harvest::proxy::ProxyStrategy;
///
/// let client = build_http_client(&FetcherConfig::default(), &ProxyStrategy::Direct).unwrap();
/// ```
pub fn build_http_client(
    config: &FetcherConfig,
    strategy: &ProxyStrategy,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = strategy.client_proxy()? {
        builder = builder.proxy(proxy);
    }

    builder.build()
}

/// [`PageTransport`] over reqwest and a [`ProxyStrategy`]
pub struct HttpTransport {
    client: Client,
    strategy: ProxyStrategy,
}

impl HttpTransport {
    pub fn new(config: &FetcherConfig, strategy: ProxyStrategy) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config, &strategy)?;
        Ok(Self { client, strategy })
    }
}

#[async_trait]
impl PageTransport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let request_url = self.strategy.request_url(url);

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Maps a reqwest error onto the transport taxonomy
///
/// Errors are reported against the target URL, never the rewritten one,
/// so API keys do not end up in logs.
fn classify_error(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: error.without_url().to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: error.without_url().to_string(),
        }
    }
}
