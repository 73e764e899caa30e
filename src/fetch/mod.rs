//! HTTP page retrieval with typed failures.
//!
//! [`PageFetcher`] wraps a shared `reqwest::Client` with explicit connect
//! and read timeouts. It performs no retries itself; retry policy belongs
//! to the orchestrator (see [`RetryPolicy`]).

mod error;
mod retry;

pub use error::FetchError;
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_download_error,
    classify_fetch_error,
};

use std::time::Duration;

use reqwest::Client;
use scraper::Html;
use tracing::{debug, instrument};
use url::Url;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// User-agent sent on all page and download requests.
pub(crate) fn default_user_agent() -> String {
    format!("apkfetch/{}", env!("CARGO_PKG_VERSION"))
}

/// Timeout configuration for page fetching.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum time to establish a connection.
    pub connect_timeout: Duration,
    /// Maximum time for the whole request, headers to body end.
    pub read_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}

/// A fetched page: the final URL after redirects plus the raw body.
///
/// The DOM is parsed on demand via [`Page::document`]. `scraper::Html` is
/// not `Send`, so extractors parse inside synchronous scopes instead of
/// holding a parsed tree across await points.
#[derive(Debug, Clone)]
pub struct Page {
    final_url: Url,
    body: String,
}

impl Page {
    /// Creates a page from a known final URL and body.
    #[must_use]
    pub fn new(final_url: Url, body: impl Into<String>) -> Self {
        Self {
            final_url,
            body: body.into(),
        }
    }

    /// The URL the response was ultimately served from.
    #[must_use]
    pub fn final_url(&self) -> &Url {
        &self.final_url
    }

    /// Parses the body into a DOM.
    #[must_use]
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// HTTP page fetcher shared across pipeline components.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Creates a fetcher with the given timeout configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when HTTP client construction fails.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .user_agent(default_user_agent())
            .gzip(true)
            .build()
            .map_err(|source| FetchError::client(source.to_string()))?;
        Ok(Self { client })
    }

    /// Retrieves `url` and returns the page body with its final URL.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] for malformed or non-http(s) URLs
    /// - [`FetchError::HttpStatus`] for non-2xx responses
    /// - [`FetchError::Redirect`] for redirect-chain failures
    /// - [`FetchError::Timeout`] when the request or body read times out
    /// - [`FetchError::Parse`] when the body cannot be decoded or is empty
    /// - [`FetchError::Network`] for other transport failures
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(url));
        }

        let response = match self.client.get(parsed).send().await {
            Ok(response) => response,
            Err(source) => return Err(FetchError::from_transport(url, source)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(source) if source.is_timeout() => return Err(FetchError::timeout(url)),
            Err(_) => {
                return Err(FetchError::parse(format!("response body from {url}")));
            }
        };
        if body.trim().is_empty() {
            return Err(FetchError::parse(format!("empty response body from {url}")));
        }

        debug!(bytes = body.len(), final_url = %final_url, "Page fetched");
        Ok(Page { final_url, body })
    }
}
