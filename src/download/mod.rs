//! Byte transfer: the "fetch bytes to path" collaborator.
//!
//! [`FileDownloader`] is the capability the orchestrator depends on;
//! [`HttpDownloader`] is the streaming production implementation. Tests
//! substitute a fake to observe destinations without network traffic.

mod error;
mod filename;

pub use error::DownloadError;
pub use filename::installer_filename;
pub(crate) use filename::sanitize_filename;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, instrument};
use url::Url;

use crate::fetch::{FetchConfig, default_user_agent};

/// Capability that transfers the bytes at a URL to a destination path.
#[async_trait]
pub trait FileDownloader: Send + Sync {
    /// Downloads `url` to `dest`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport, status, or IO failure.
    async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf, DownloadError>;
}

/// Streaming HTTP downloader.
///
/// Create once and reuse; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Creates a downloader with the given timeout configuration.
    ///
    /// The read timeout applies per read, not to the whole transfer, so
    /// large installers are not cut off mid-stream.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] when client construction fails.
    pub fn new(config: &FetchConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(default_user_agent())
            .gzip(true)
            .build()
            .map_err(|source| DownloadError::client(source.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FileDownloader for HttpDownloader {
    #[instrument(skip(self))]
    async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = match self.client.get(parsed).send().await {
            Ok(response) => response,
            Err(source) => return Err(DownloadError::from_transport(url, source)),
        };
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::io(parent, source))?;
        }
        let file = File::create(dest)
            .await
            .map_err(|source| DownloadError::io(dest, source))?;
        let mut writer = BufWriter::new(file);

        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(source) => return Err(DownloadError::from_transport(url, source)),
            };
            writer
                .write_all(&chunk)
                .await
                .map_err(|source| DownloadError::io(dest, source))?;
            bytes_written += chunk.len() as u64;
        }
        writer
            .flush()
            .await
            .map_err(|source| DownloadError::io(dest, source))?;

        info!(bytes = bytes_written, path = %dest.display(), "Download complete");
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_body_to_destination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/super-app.apk"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"installer bytes".to_vec()))
            .mount(&server)
            .await;

        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("com.example.app").join("Super App-1.0.apk");
        let downloader = HttpDownloader::new(&FetchConfig::default()).unwrap();
        let written = downloader
            .download(&format!("{}/files/super-app.apk", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"installer bytes");
    }

    #[tokio::test]
    async fn test_download_non_2xx_is_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/missing.apk"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("missing.apk");
        let downloader = HttpDownloader::new(&FetchConfig::default()).unwrap();
        let error = downloader
            .download(&format!("{}/files/missing.apk", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(
            matches!(error, DownloadError::HttpStatus { status: 404, .. }),
            "got: {error}"
        );
        assert!(!dest.exists(), "no file should be created on HTTP error");
    }

    #[tokio::test]
    async fn test_download_invalid_url_rejected() {
        let downloader = HttpDownloader::new(&FetchConfig::default()).unwrap();
        let error = downloader
            .download("not a url", Path::new("/tmp/never.apk"))
            .await
            .unwrap_err();
        assert!(matches!(error, DownloadError::InvalidUrl { .. }));
    }
}
