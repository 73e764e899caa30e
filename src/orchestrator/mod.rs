//! End-to-end pipeline orchestration.
//!
//! Drives fetch → extract → search → match → resolve → download. The first
//! three stages are terminal on failure (no candidate can be evaluated
//! without canonical metadata or search results); everything per-candidate
//! is isolated, so one candidate's failure never aborts the run.
//!
//! Accepted candidates fan out on a bounded concurrent stream whose output
//! order always equals input order, keeping reports reproducible
//! regardless of completion timing.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use futures_util::stream;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancelToken;
use crate::canonical::{CanonicalMetadata, ExtractError, extract_metadata};
use crate::download::{DownloadError, FileDownloader, installer_filename, sanitize_filename};
use crate::fetch::{
    FetchError, PageFetcher, RetryDecision, RetryPolicy, classify_download_error,
    classify_fetch_error,
};
use crate::listing::{ListingError, ListingResolver, Resolution};
use crate::matcher::filter_and_match;
use crate::mirror::{MirrorError, MirrorSearchClient, RawCandidate};
use crate::report::{CandidateOutcome, DownloadResult, RunReport};
use crate::urls;

/// Default per-candidate fan-out width.
pub const DEFAULT_CONCURRENCY: usize = 4;

const CANCELLED_REASON: &str = "run cancelled";

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The identifier could not be turned into a canonical URL.
    #[error("invalid canonical URL for identifier `{identifier}`")]
    InvalidIdentifier {
        /// The offending identifier.
        identifier: String,
    },

    /// The canonical listing page could not be fetched.
    #[error("canonical page fetch failed for {url}: {source}")]
    CanonicalFetch {
        /// The canonical listing URL.
        url: String,
        /// The underlying fetch failure.
        #[source]
        source: FetchError,
    },

    /// The canonical listing lacked a required field.
    #[error("canonical metadata extraction failed for `{identifier}`: {source}")]
    Extract {
        /// The identifier being resolved.
        identifier: String,
        /// The underlying extraction failure.
        #[source]
        source: ExtractError,
    },

    /// The mirror search could not produce candidates.
    #[error("mirror search failed for query `{query}`: {source}")]
    Search {
        /// The search query (canonical title).
        query: String,
        /// The underlying mirror failure.
        #[source]
        source: MirrorError,
    },

    /// The run was cancelled at a stage boundary.
    #[error("run cancelled during {stage}")]
    Cancelled {
        /// The stage active when cancellation was observed.
        stage: &'static str,
    },
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory installers are written under (one subdir per identifier).
    pub output_dir: PathBuf,
    /// Per-candidate fan-out width.
    pub concurrency: usize,
    /// Retry policy for transient per-candidate network failures.
    pub retry_policy: RetryPolicy,
    /// Canonical store base URL (overridable for tests).
    pub canonical_base_url: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            concurrency: DEFAULT_CONCURRENCY,
            retry_policy: RetryPolicy::default(),
            canonical_base_url: urls::CANONICAL_BASE_URL.to_string(),
        }
    }
}

/// Drives the full identifier-to-installer pipeline.
pub struct DownloadOrchestrator {
    fetcher: PageFetcher,
    mirror: MirrorSearchClient,
    resolver: ListingResolver,
    downloader: Box<dyn FileDownloader>,
    config: OrchestratorConfig,
}

impl DownloadOrchestrator {
    /// Assembles an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        fetcher: PageFetcher,
        mirror: MirrorSearchClient,
        resolver: ListingResolver,
        downloader: Box<dyn FileDownloader>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            fetcher,
            mirror,
            resolver,
            downloader,
            config,
        }
    }

    /// Runs the pipeline for `identifier`.
    ///
    /// Always returns a result entry for every candidate that survived
    /// matching, even when all of them fail.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] for terminal-stage failures (canonical fetch,
    /// extraction, mirror search) or stage-boundary cancellation.
    #[instrument(skip_all, fields(identifier = %identifier))]
    pub async fn run(
        &self,
        identifier: &str,
        cancel: &CancelToken,
    ) -> Result<RunReport, RunError> {
        ensure_active(cancel, "fetching")?;
        let url = urls::canonical_details_url(&self.config.canonical_base_url, identifier)
            .map_err(|_| RunError::InvalidIdentifier {
                identifier: identifier.to_string(),
            })?;
        info!(url = %url, "Fetching canonical listing");
        let page = self
            .fetcher
            .fetch(url.as_str())
            .await
            .map_err(|source| RunError::CanonicalFetch {
                url: url.to_string(),
                source,
            })?;

        ensure_active(cancel, "extracting")?;
        let canonical =
            extract_metadata(identifier, &page).map_err(|source| RunError::Extract {
                identifier: identifier.to_string(),
                source,
            })?;
        info!(
            title = %canonical.title,
            publisher = %canonical.publisher,
            "Canonical metadata extracted"
        );

        ensure_active(cancel, "searching")?;
        let candidates =
            self.mirror
                .search(&canonical.title)
                .await
                .map_err(|source| RunError::Search {
                    query: canonical.title.clone(),
                    source,
                })?;
        info!(candidates = candidates.len(), "Mirror search complete");

        ensure_active(cancel, "matching")?;
        let decisions = filter_and_match(candidates, &canonical);
        let accepted: Vec<RawCandidate> = decisions
            .iter()
            .filter(|decision| decision.accepted)
            .map(|decision| decision.candidate.clone())
            .collect();
        info!(
            accepted = accepted.len(),
            rejected = decisions.len() - accepted.len(),
            "Candidates matched"
        );

        let dest_dir = self.config.output_dir.join(sanitize_filename(identifier));
        let results = stream::iter(accepted)
            .map(|candidate| self.process_candidate(candidate, &canonical, &dest_dir, cancel))
            .buffered(self.config.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        Ok(RunReport {
            identifier: identifier.to_string(),
            canonical,
            decisions,
            results,
        })
    }

    async fn process_candidate(
        &self,
        candidate: RawCandidate,
        canonical: &CanonicalMetadata,
        dest_dir: &Path,
        cancel: &CancelToken,
    ) -> DownloadResult {
        let label = candidate.label.clone();
        let reference_url = candidate.reference_url.clone().unwrap_or_default();

        if cancel.is_cancelled() {
            return DownloadResult {
                label,
                reference_url,
                outcome: CandidateOutcome::Skipped {
                    reason: CANCELLED_REASON.to_string(),
                },
            };
        }

        let resolution = match self.resolve_with_retry(&candidate, canonical).await {
            Ok(resolution) => resolution,
            Err(error) => {
                warn!(label = %label, error = %error, "Candidate resolution failed");
                return DownloadResult {
                    label,
                    reference_url,
                    outcome: CandidateOutcome::Failed {
                        stage: "resolving".to_string(),
                        error: error.to_string(),
                    },
                };
            }
        };

        let listing = match resolution {
            Resolution::Resolved(listing) => listing,
            Resolution::Rejected { reason } => {
                info!(label = %label, reason = %reason, "Candidate rejected");
                return DownloadResult {
                    label,
                    reference_url,
                    outcome: CandidateOutcome::Rejected { reason },
                };
            }
        };

        if cancel.is_cancelled() {
            return DownloadResult {
                label,
                reference_url,
                outcome: CandidateOutcome::Skipped {
                    reason: CANCELLED_REASON.to_string(),
                },
            };
        }

        let dest = dest_dir.join(installer_filename(&listing.title, &listing.version));
        match self
            .download_with_retry(&listing.download_url, &dest)
            .await
        {
            Ok(path) => {
                info!(label = %label, path = %path.display(), "Installer downloaded");
                DownloadResult {
                    label,
                    reference_url,
                    outcome: CandidateOutcome::Downloaded { listing, path },
                }
            }
            Err(error) => {
                warn!(label = %label, error = %error, "Installer download failed");
                DownloadResult {
                    label,
                    reference_url,
                    outcome: CandidateOutcome::Failed {
                        stage: "downloading".to_string(),
                        error: error.to_string(),
                    },
                }
            }
        }
    }

    async fn resolve_with_retry(
        &self,
        candidate: &RawCandidate,
        canonical: &CanonicalMetadata,
    ) -> Result<Resolution, ListingError> {
        let mut attempt = 1;
        loop {
            match self.resolver.resolve(candidate, canonical).await {
                Ok(resolution) => return Ok(resolution),
                Err(ListingError::Fetch(error)) => {
                    let decision = self
                        .config
                        .retry_policy
                        .should_retry(classify_fetch_error(&error), attempt);
                    match decision {
                        RetryDecision::Retry {
                            delay,
                            attempt: next,
                        } => {
                            sleep(delay).await;
                            attempt = next;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(reason = %reason, "Not retrying resolution");
                            return Err(ListingError::Fetch(error));
                        }
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn download_with_retry(
        &self,
        url: &str,
        dest: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let mut attempt = 1;
        loop {
            match self.downloader.download(url, dest).await {
                Ok(path) => return Ok(path),
                Err(error) => {
                    let decision = self
                        .config
                        .retry_policy
                        .should_retry(classify_download_error(&error), attempt);
                    match decision {
                        RetryDecision::Retry {
                            delay,
                            attempt: next,
                        } => {
                            sleep(delay).await;
                            attempt = next;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(reason = %reason, "Not retrying download");
                            return Err(error);
                        }
                    }
                }
            }
        }
    }
}

fn ensure_active(cancel: &CancelToken, stage: &'static str) -> Result<(), RunError> {
    if cancel.is_cancelled() {
        return Err(RunError::Cancelled { stage });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.canonical_base_url, urls::CANONICAL_BASE_URL);
        assert_eq!(config.output_dir, PathBuf::from("downloads"));
    }

    #[test]
    fn test_ensure_active_passes_without_cancel() {
        let token = CancelToken::new();
        assert!(ensure_active(&token, "fetching").is_ok());
    }

    #[test]
    fn test_ensure_active_reports_stage() {
        let token = CancelToken::new();
        token.cancel();
        let error = ensure_active(&token, "searching").unwrap_err();
        assert!(matches!(error, RunError::Cancelled { stage: "searching" }));
    }
}
