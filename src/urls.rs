//! Structured URL construction for the canonical store and the mirror site.
//!
//! Query components are percent-encoded via the `url` crate; identifiers and
//! titles containing special characters survive intact.

use url::Url;

/// Canonical store base URL.
pub const CANONICAL_BASE_URL: &str = "https://play.google.com";

/// Canonical store listing path.
const CANONICAL_DETAILS_PATH: &str = "/store/apps/details";

/// Mirror site base URL.
pub const MIRROR_BASE_URL: &str = "https://www.androiddrawer.com";

/// Mirror site search path.
const MIRROR_SEARCH_PATH: &str = "/search-results/";

/// Builds the canonical listing URL for an application identifier.
///
/// # Errors
///
/// Returns [`url::ParseError`] when `base` is not a valid absolute URL.
pub fn canonical_details_url(base: &str, identifier: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.set_path(CANONICAL_DETAILS_PATH);
    url.query_pairs_mut().append_pair("id", identifier);
    Ok(url)
}

/// Builds the mirror search URL for a title query.
///
/// # Errors
///
/// Returns [`url::ParseError`] when `base` is not a valid absolute URL.
pub fn mirror_search_url(base: &str, query: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.set_path(MIRROR_SEARCH_PATH);
    url.query_pairs_mut().append_pair("q", query);
    Ok(url)
}

/// Resolves a possibly relative URL string against a base URL.
///
/// Returns the value as-is if it already starts with `http://` or
/// `https://`; normalizes `//...` to `https:...`; otherwise joins with
/// `base`.
#[must_use]
pub fn absolutize(value: &str, base: &Url) -> Option<String> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    if value.starts_with("//") {
        return Some(format!("https:{value}"));
    }
    base.join(value).ok().map(|url| url.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize_absolute_unchanged() {
        let base = Url::parse("https://mirror.example/app/").unwrap();
        assert_eq!(
            absolutize("https://cdn.example/file.apk", &base),
            Some("https://cdn.example/file.apk".to_string())
        );
    }

    #[test]
    fn test_absolutize_protocol_relative() {
        let base = Url::parse("https://mirror.example/app/").unwrap();
        assert_eq!(
            absolutize("//cdn.example/file.apk", &base),
            Some("https://cdn.example/file.apk".to_string())
        );
    }

    #[test]
    fn test_absolutize_relative_joins_base() {
        let base = Url::parse("https://mirror.example/app/").unwrap();
        assert_eq!(
            absolutize("file.apk", &base),
            Some("https://mirror.example/app/file.apk".to_string())
        );
    }

    #[test]
    fn test_canonical_details_url_appends_identifier() {
        let url = canonical_details_url(CANONICAL_BASE_URL, "com.example.app").unwrap();
        assert_eq!(
            url.as_str(),
            "https://play.google.com/store/apps/details?id=com.example.app"
        );
    }

    #[test]
    fn test_mirror_search_url_encodes_spaces() {
        let url = mirror_search_url(MIRROR_BASE_URL, "Super App").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.androiddrawer.com/search-results/?q=Super+App"
        );
    }

    #[test]
    fn test_mirror_search_url_encodes_special_characters() {
        let url = mirror_search_url(MIRROR_BASE_URL, "C&C: Rivals").unwrap();
        let query = url.query().unwrap();
        assert!(!query.contains('&') || query.starts_with("q="), "ampersand must be encoded: {query}");
        assert!(query.contains("%26"), "expected %26 in: {query}");
    }

    #[test]
    fn test_urls_against_custom_base_for_tests() {
        let url = canonical_details_url("http://127.0.0.1:9000", "com.x").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/store/apps/details?id=com.x");
    }

    #[test]
    fn test_invalid_base_rejected() {
        assert!(canonical_details_url("not a url", "com.x").is_err());
        assert!(mirror_search_url("", "query").is_err());
    }
}
