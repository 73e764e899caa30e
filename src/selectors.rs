//! Shared selector utilities: static selector compilation and element helpers.

use scraper::{ElementRef, Html, Selector};

/// Compiles a CSS selector at static init; panics on an invalid pattern.
pub fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector)
        .unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e}"))
}

/// Returns the trimmed text of an element's descendants.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Returns the trimmed text of the first match, or `None` when the selector
/// matches nothing or the text is empty.
#[must_use]
pub fn select_first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Returns the trimmed value of `attr` on the first match, or `None` when
/// the selector matches nothing or the attribute is absent/empty.
#[must_use]
pub fn select_first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
