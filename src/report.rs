//! Run report types: the orchestration's terminal output.
//!
//! One [`DownloadResult`] per candidate that survived matching, in the
//! original candidate order. The whole report serializes to JSON for the
//! `--json` CLI surface.

use std::path::PathBuf;

use serde::Serialize;

use crate::canonical::CanonicalMetadata;
use crate::listing::ResolvedListing;
use crate::matcher::MatchDecision;

/// Final output of a pipeline run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// The identifier the run was started with.
    pub identifier: String,
    /// Ground-truth metadata from the canonical store.
    pub canonical: CanonicalMetadata,
    /// Every matching decision, accepted or not.
    pub decisions: Vec<MatchDecision>,
    /// One entry per accepted candidate, in input order.
    pub results: Vec<DownloadResult>,
}

impl RunReport {
    /// Number of installers transferred to disk.
    #[must_use]
    pub fn downloaded_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, CandidateOutcome::Downloaded { .. }))
    }

    /// Number of listings rejected at re-validation.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, CandidateOutcome::Rejected { .. }))
    }

    /// Number of candidates that failed resolving or downloading.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, CandidateOutcome::Failed { .. }))
    }

    /// Number of candidates abandoned due to cancellation.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, CandidateOutcome::Skipped { .. }))
    }

    fn count(&self, predicate: impl Fn(&CandidateOutcome) -> bool) -> usize {
        self.results
            .iter()
            .filter(|result| predicate(&result.outcome))
            .count()
    }
}

/// Terminal outcome for one accepted candidate.
#[derive(Debug, Serialize)]
pub struct DownloadResult {
    /// The candidate's search-result label.
    pub label: String,
    /// The candidate's detail-page URL.
    pub reference_url: String,
    /// What happened to the candidate.
    pub outcome: CandidateOutcome,
}

/// Per-candidate outcome after the resolving/downloading fan-out.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// Installer transferred to disk.
    Downloaded {
        /// The validated listing.
        listing: ResolvedListing,
        /// Where the installer landed.
        path: PathBuf,
    },
    /// Listing did not re-validate against canonical metadata.
    Rejected {
        /// Why the listing was rejected.
        reason: String,
    },
    /// Resolution or transfer failed; isolated to this candidate.
    Failed {
        /// Which stage failed ("resolving" or "downloading").
        stage: String,
        /// The failure rendered as text.
        error: String,
    },
    /// Abandoned due to cooperative cancellation.
    Skipped {
        /// Why the candidate was skipped.
        reason: String,
    },
}
