//! Mirror site search: render, parse, and extract raw candidates.
//!
//! Search results on the mirror are populated by client-side script, so
//! [`MirrorSearchClient`] delegates to a [`Renderer`] and parses the
//! materialized snapshot file instead of the live response. Zero result
//! elements is a valid outcome and returns an empty sequence; only
//! rendering/reading failures are errors.

mod render;

pub use render::{CommandRenderer, RenderError, Renderer};

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use scraper::{Html, Selector};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::download::sanitize_filename;
use crate::selectors::{compile_static_selector, element_text};
use crate::urls;

static RESULT_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.gs-title a"));

const RESULT_URL_ATTR: &str = "data-ctorig";

/// One unverified mirror search result.
#[derive(Debug, Clone, Serialize)]
pub struct RawCandidate {
    /// The result's visible label text.
    pub label: String,
    /// The result's target URL; may be absent and must not be trusted.
    pub reference_url: Option<String>,
}

/// Errors produced by the mirror search step.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The external renderer failed to materialize the results page.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The search query could not be turned into a URL.
    #[error("invalid mirror search URL for query `{query}`")]
    InvalidQuery {
        /// The offending query string.
        query: String,
    },

    /// The rendered snapshot could not be read back.
    #[error("cannot read rendered snapshot {path}: {source}")]
    Snapshot {
        /// Path of the snapshot file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Client that searches the mirror site through the render step.
pub struct MirrorSearchClient {
    renderer: Box<dyn Renderer>,
    base_url: String,
    snapshot_dir: PathBuf,
}

impl MirrorSearchClient {
    /// Creates a client rendering against `base_url`, writing snapshot
    /// files under `snapshot_dir`.
    #[must_use]
    pub fn new(
        renderer: Box<dyn Renderer>,
        base_url: impl Into<String>,
        snapshot_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            renderer,
            base_url: base_url.into(),
            snapshot_dir: snapshot_dir.into(),
        }
    }

    /// Searches the mirror for `query` and returns the raw candidates.
    ///
    /// Returns an empty sequence when the results page contains no result
    /// elements; duplicates (same reference URL) are dropped, first seen
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError`] when the search URL is invalid, rendering
    /// fails, or the snapshot cannot be read.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<RawCandidate>, MirrorError> {
        let url = urls::mirror_search_url(&self.base_url, query).map_err(|_| {
            MirrorError::InvalidQuery {
                query: query.to_string(),
            }
        })?;
        let snapshot_path = self.snapshot_path(query);
        tokio::fs::create_dir_all(&self.snapshot_dir)
            .await
            .map_err(|source| MirrorError::Snapshot {
                path: self.snapshot_dir.clone(),
                source,
            })?;

        info!(url = %url, snapshot = %snapshot_path.display(), "Rendering mirror search results");
        self.renderer.render(&url, &snapshot_path).await?;

        let body = tokio::fs::read_to_string(&snapshot_path)
            .await
            .map_err(|source| MirrorError::Snapshot {
                path: snapshot_path.clone(),
                source,
            })?;

        let candidates = parse_candidates(&body);
        debug!(candidates = candidates.len(), "Mirror search parsed");
        Ok(candidates)
    }

    fn snapshot_path(&self, query: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let slug = sanitize_filename(&query.to_lowercase().replace(' ', "-"));
        self.snapshot_dir
            .join(format!("mirror-search-{slug}-{stamp}.html"))
    }
}

/// Extracts candidate entries from a rendered results document.
///
/// Entries sharing a reference URL collapse to the first occurrence; the
/// render step is known to surface duplicate DOM nodes for one underlying
/// result.
fn parse_candidates(body: &str) -> Vec<RawCandidate> {
    let document = Html::parse_document(body);
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for element in document.select(&RESULT_LINK_SELECTOR) {
        let label = element_text(element);
        let reference_url = element
            .value()
            .attr(RESULT_URL_ATTR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if let Some(url) = &reference_url
            && !seen.insert(url.clone())
        {
            debug!(url = %url, "Duplicate search result dropped");
            continue;
        }

        candidates.push(RawCandidate {
            label,
            reference_url,
        });
    }

    candidates
}
