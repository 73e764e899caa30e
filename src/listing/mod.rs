//! Detail-page resolution for accepted candidates.
//!
//! Fetches a candidate's listing page, splits the composite heading into
//! title and version, and re-validates the title against canonical
//! metadata. A mismatch is an expected outcome ([`Resolution::Rejected`]),
//! not an error; a listing page without a download link is malformed and
//! fails with a parse error.

use std::sync::LazyLock;

use scraper::Selector;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::canonical::CanonicalMetadata;
use crate::fetch::{FetchError, Page, PageFetcher};
use crate::matcher::normalize;
use crate::mirror::RawCandidate;
use crate::selectors::{compile_static_selector, select_first_attr, select_first_text};
use crate::urls;

static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("h1.entry-title"));
static DEVELOPER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("a.app-developer"));
static DOWNLOAD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("a.download-btn"));

/// A candidate whose detail page has been fetched and validated.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedListing {
    /// Listing title (heading minus the trailing version token).
    pub title: String,
    /// Trailing version token from the heading.
    pub version: String,
    /// Publisher from the developer link; empty when absent.
    pub publisher: String,
    /// Concrete installer URL.
    pub download_url: String,
}

/// Outcome of resolving one candidate's detail page.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The listing re-validated against canonical metadata.
    Resolved(ResolvedListing),
    /// The listing exists but does not match the canonical title.
    Rejected {
        /// Why the listing was rejected.
        reason: String,
    },
}

/// Errors produced by listing resolution.
#[derive(Debug, Error)]
pub enum ListingError {
    /// Fetching the detail page failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The detail page is malformed or incompatible.
    #[error("listing page at {url} is missing {what}")]
    Parse {
        /// The detail page URL.
        url: String,
        /// What could not be extracted.
        what: &'static str,
    },

    /// The candidate carried no reference URL (filtered upstream).
    #[error("candidate `{label}` has no reference URL")]
    MissingReference {
        /// The candidate's label.
        label: String,
    },
}

/// Resolves accepted candidates into concrete listings.
#[derive(Debug, Clone)]
pub struct ListingResolver {
    fetcher: PageFetcher,
}

impl ListingResolver {
    /// Creates a resolver sharing the given fetcher's connection pool.
    #[must_use]
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetches and validates one candidate's detail page.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError`] for fetch failures or malformed pages;
    /// title mismatches surface as `Ok(Resolution::Rejected)`.
    #[instrument(skip(self, candidate, canonical), fields(label = %candidate.label))]
    pub async fn resolve(
        &self,
        candidate: &RawCandidate,
        canonical: &CanonicalMetadata,
    ) -> Result<Resolution, ListingError> {
        let Some(url) = candidate.reference_url.as_deref() else {
            return Err(ListingError::MissingReference {
                label: candidate.label.clone(),
            });
        };
        let page = self.fetcher.fetch(url).await?;
        resolve_from_page(&page, canonical)
    }
}

fn resolve_from_page(
    page: &Page,
    canonical: &CanonicalMetadata,
) -> Result<Resolution, ListingError> {
    let url = page.final_url().to_string();
    let document = page.document();

    let heading =
        select_first_text(&document, &HEADING_SELECTOR).ok_or(ListingError::Parse {
            url: url.clone(),
            what: "heading",
        })?;
    let (title, version) = split_heading(&heading);

    let publisher = select_first_text(&document, &DEVELOPER_SELECTOR).unwrap_or_default();
    if !publisher.is_empty() {
        // Soft signal only: mirror publishers are frequently abbreviated.
        let similarity =
            strsim::jaro_winkler(&normalize(&publisher), &normalize(&canonical.publisher));
        debug!(
            publisher = %publisher,
            canonical_publisher = %canonical.publisher,
            similarity,
            "Publisher soft signal"
        );
    }

    let needle = normalize(&canonical.title);
    if needle.is_empty() || !normalize(&title).contains(&needle) {
        info!(listing_title = %title, "Listing title does not contain canonical title");
        return Ok(Resolution::Rejected {
            reason: "title mismatch".to_string(),
        });
    }

    let href = select_first_attr(&document, &DOWNLOAD_SELECTOR, "href").ok_or(
        ListingError::Parse {
            url: url.clone(),
            what: "download link",
        },
    )?;
    let download_url = urls::absolutize(&href, page.final_url()).ok_or(ListingError::Parse {
        url,
        what: "download link",
    })?;

    Ok(Resolution::Resolved(ResolvedListing {
        title,
        version,
        publisher,
        download_url,
    }))
}

/// Splits a composite heading: the last whitespace-delimited token is the
/// version, the remainder rejoined with single spaces is the title.
fn split_heading(heading: &str) -> (String, String) {
    let mut tokens: Vec<&str> = heading.split_whitespace().collect();
    let version = tokens.pop().unwrap_or_default().to_string();
    (tokens.join(" "), version)
}
