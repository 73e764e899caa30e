//! Canonical store metadata extraction.
//!
//! Pulls the ground-truth title and publisher from the canonical listing
//! page. A listing without both fields cannot be matched against the
//! mirror, so a missing field is terminal for the whole run.

use std::sync::LazyLock;

use scraper::Selector;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::fetch::Page;
use crate::selectors::{compile_static_selector, select_first_text};

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.info-container div.document-title"));
static PUBLISHER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.info-container .document-subtitle"));

/// Ground-truth application metadata from the canonical store.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalMetadata {
    /// The caller-supplied application identifier.
    pub identifier: String,
    /// Application title, whitespace-trimmed.
    pub title: String,
    /// Publisher/developer name, whitespace-trimmed.
    pub publisher: String,
}

/// Errors produced by canonical metadata extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A required field's selector matched zero elements (or only empty text).
    #[error("canonical listing is missing required field `{field}`")]
    MissingField {
        /// Which field was absent.
        field: &'static str,
    },
}

/// Extracts title and publisher from a canonical listing page.
///
/// # Errors
///
/// Returns [`ExtractError::MissingField`] naming the field whose selector
/// matched nothing.
pub fn extract_metadata(identifier: &str, page: &Page) -> Result<CanonicalMetadata, ExtractError> {
    let document = page.document();
    let title = select_first_text(&document, &TITLE_SELECTOR)
        .ok_or(ExtractError::MissingField { field: "title" })?;
    let publisher = select_first_text(&document, &PUBLISHER_SELECTOR)
        .ok_or(ExtractError::MissingField { field: "publisher" })?;
    debug!(%title, %publisher, "Canonical metadata extracted");
    Ok(CanonicalMetadata {
        identifier: identifier.to_string(),
        title,
        publisher,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    fn page(body: &str) -> Page {
        Page::new(
            Url::parse("https://play.google.com/store/apps/details?id=com.example.app").unwrap(),
            body,
        )
    }

    const LISTING: &str = r#"
        <html><body>
          <div class="info-container">
            <div class="document-title">  Super App  </div>
            <div class="document-subtitle"> Super Corporation </div>
          </div>
        </body></html>"#;

    #[test]
    fn test_extract_trims_title_and_publisher() {
        let metadata = extract_metadata("com.example.app", &page(LISTING)).unwrap();
        assert_eq!(metadata.identifier, "com.example.app");
        assert_eq!(metadata.title, "Super App");
        assert_eq!(metadata.publisher, "Super Corporation");
    }

    #[test]
    fn test_extract_missing_title_names_field() {
        let body = r#"<div class="info-container">
            <div class="document-subtitle">Super Corporation</div>
        </div>"#;
        let error = extract_metadata("com.example.app", &page(body)).unwrap_err();
        assert!(matches!(error, ExtractError::MissingField { field: "title" }));
    }

    #[test]
    fn test_extract_missing_publisher_names_field() {
        let body = r#"<div class="info-container">
            <div class="document-title">Super App</div>
        </div>"#;
        let error = extract_metadata("com.example.app", &page(body)).unwrap_err();
        assert!(matches!(
            error,
            ExtractError::MissingField { field: "publisher" }
        ));
    }

    #[test]
    fn test_extract_empty_title_treated_as_missing() {
        let body = r#"<div class="info-container">
            <div class="document-title">   </div>
            <div class="document-subtitle">Super Corporation</div>
        </div>"#;
        let error = extract_metadata("com.example.app", &page(body)).unwrap_err();
        assert!(matches!(error, ExtractError::MissingField { field: "title" }));
    }

    #[test]
    fn test_extract_takes_first_subtitle() {
        let body = r#"<div class="info-container">
            <div class="document-title">Super App</div>
            <div class="document-subtitle">Super Corporation</div>
            <div class="document-subtitle">Tools</div>
        </div>"#;
        let metadata = extract_metadata("com.example.app", &page(body)).unwrap();
        assert_eq!(metadata.publisher, "Super Corporation");
    }
}
