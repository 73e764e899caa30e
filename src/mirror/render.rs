//! External rendering capability for script-populated pages.
//!
//! The mirror site fills its search results client-side, so the raw
//! response is useless; a renderer materializes the fully-populated DOM
//! into a file the search client can parse. The capability is a trait so
//! tests can substitute a fake that writes fixture HTML.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};
use url::Url;

const RENDER_TIMEOUT_SECS: u64 = 60;

/// Errors produced by the render step.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer command could not be launched.
    #[error("failed to launch renderer `{command}`: {source}")]
    Spawn {
        /// The program that failed to start.
        command: String,
        /// The underlying launch error.
        #[source]
        source: std::io::Error,
    },

    /// The renderer ran but exited unsuccessfully.
    #[error("renderer exited with {status} for {url}")]
    CommandFailed {
        /// The page being rendered.
        url: String,
        /// The process exit status.
        status: String,
    },

    /// The renderer did not finish within the allowed time.
    #[error("renderer timed out after {seconds}s for {url}")]
    Timeout {
        /// The page being rendered.
        url: String,
        /// The timeout that expired.
        seconds: u64,
    },

    /// The renderer exited cleanly but produced no usable output file.
    #[error("renderer produced no usable output for {url}: {detail}")]
    InvalidOutput {
        /// The page being rendered.
        url: String,
        /// What was wrong with the output.
        detail: String,
    },
}

/// Capability that materializes a rendered page into a file.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Writes the fully-rendered HTML of `url` to `output_path`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the page could not be materialized.
    async fn render(&self, url: &Url, output_path: &Path) -> Result<(), RenderError>;
}

/// Renderer that shells out to an external headless-browser command.
///
/// The command is invoked as `<program> [args...] <url> <output-file>` and
/// must write the rendered HTML to the output file.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRenderer {
    /// Creates a renderer invoking `program` with no extra arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(RENDER_TIMEOUT_SECS),
        }
    }

    /// Adds fixed arguments placed before the URL and output path.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Overrides the render timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    #[instrument(skip(self), fields(program = %self.program))]
    async fn render(&self, url: &Url, output_path: &Path) -> Result<(), RenderError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(url.as_str())
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
            Ok(Err(source)) => {
                return Err(RenderError::Spawn {
                    command: self.program.clone(),
                    source,
                });
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(RenderError::CommandFailed {
                url: url.to_string(),
                status: output.status.to_string(),
            });
        }

        let metadata = tokio::fs::metadata(output_path)
            .await
            .map_err(|_| RenderError::InvalidOutput {
                url: url.to_string(),
                detail: "output file missing".to_string(),
            })?;
        if metadata.len() == 0 {
            return Err(RenderError::InvalidOutput {
                url: url.to_string(),
                detail: "output file empty".to_string(),
            });
        }

        debug!(bytes = metadata.len(), path = %output_path.display(), "Render complete");
        Ok(())
    }
}
