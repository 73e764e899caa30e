//! Error types for page fetching.

use thiserror::Error;

/// Errors that can occur while retrieving a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response (non-2xx).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Excessive or unexpected redirect chain.
    #[error("redirect error fetching {url}")]
    Redirect {
        /// The URL whose redirect chain failed.
        url: String,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Response body could not be interpreted as a document.
    #[error("parse error: {context}")]
    Parse {
        /// What failed to parse.
        context: String,
    },

    /// The provided URL is malformed or uses an unsupported scheme.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// HTTP client could not be constructed.
    #[error("HTTP client construction failed: {detail}")]
    Client {
        /// Builder failure detail.
        detail: String,
    },
}

impl FetchError {
    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a redirect error.
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect { url: url.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a parse error.
    pub fn parse(context: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a client construction error.
    pub fn client(detail: impl Into<String>) -> Self {
        Self::Client {
            detail: detail.into(),
        }
    }

    /// Classifies a transport error from `reqwest` into the fetch taxonomy.
    ///
    /// Timeouts and redirect-policy failures get their own variants so the
    /// retry layer and callers can distinguish them from generic network
    /// faults.
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if source.is_redirect() {
            Self::Redirect { url }
        } else {
            Self::Network { url, source }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display_carries_status_and_url() {
        let error = FetchError::http_status("https://example.com/listing", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/listing"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_timeout_display() {
        let error = FetchError::timeout("https://example.com/slow");
        assert!(error.to_string().contains("timeout"));
    }

    #[test]
    fn test_redirect_display() {
        let error = FetchError::redirect("https://example.com/loop");
        let msg = error.to_string();
        assert!(msg.contains("redirect"), "Expected 'redirect' in: {msg}");
        assert!(msg.contains("/loop"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_parse_display_carries_context() {
        let error = FetchError::parse("empty response body from https://example.com");
        assert!(error.to_string().contains("empty response body"));
    }

    #[test]
    fn test_invalid_url_display() {
        let error = FetchError::invalid_url("ftp://example.com/file");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
    }
}
