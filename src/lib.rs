//! APK Fetch Core Library
//!
//! This library resolves an application identifier from a canonical store
//! listing to a downloadable installer package hosted on a third-party
//! mirror site.
//!
//! # Architecture
//!
//! The pipeline runs leaf to root:
//! - [`fetch`] - HTTP page retrieval with typed failures
//! - [`canonical`] - title/publisher extraction from the canonical listing
//! - [`mirror`] - mirror search via an external renderer capability
//! - [`matcher`] - candidate filtering against canonical metadata
//! - [`listing`] - detail-page resolution and re-validation
//! - [`download`] - byte transfer to disk
//! - [`orchestrator`] - end-to-end sequencing with per-candidate isolation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cancel;
pub mod canonical;
pub mod download;
pub mod fetch;
pub mod listing;
pub mod matcher;
pub mod mirror;
pub mod orchestrator;
pub mod report;
pub mod selectors;
pub mod urls;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use canonical::{CanonicalMetadata, ExtractError, extract_metadata};
pub use download::{DownloadError, FileDownloader, HttpDownloader, installer_filename};
pub use fetch::{
    FailureType, FetchConfig, FetchError, Page, PageFetcher, RetryDecision, RetryPolicy,
    classify_download_error, classify_fetch_error,
};
pub use listing::{ListingError, ListingResolver, Resolution, ResolvedListing};
pub use matcher::{MatchDecision, filter_and_match, normalize};
pub use mirror::{
    CommandRenderer, MirrorError, MirrorSearchClient, RawCandidate, RenderError, Renderer,
};
pub use orchestrator::{DEFAULT_CONCURRENCY, DownloadOrchestrator, OrchestratorConfig, RunError};
pub use report::{CandidateOutcome, DownloadResult, RunReport};
