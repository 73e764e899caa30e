//! Candidate filtering against canonical metadata.
//!
//! The pre-filter here is deliberately permissive: it only selects which
//! candidates proceed to detail-page resolution, where a second, stricter
//! title check runs against the resolved listing itself. Publisher strings
//! on the mirror are often abbreviated relative to the canonical publisher,
//! so publisher is never used as a filter.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::canonical::CanonicalMetadata;
use crate::mirror::RawCandidate;

/// Rejection reason for candidates with no usable reference URL.
pub const REASON_MISSING_REFERENCE_URL: &str = "missing reference url";

/// Rejection reason for candidates whose reference/label lacks the title.
pub const REASON_TITLE_NOT_CONTAINED: &str = "title not contained";

/// Acceptance reason recorded on pre-filter matches.
pub const REASON_TITLE_CONTAINED: &str = "title contained in result";

static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}]+").unwrap_or_else(|e| panic!("invalid static regex: {e}"))
});

/// One matching decision per raw candidate, kept for observability.
#[derive(Debug, Clone, Serialize)]
pub struct MatchDecision {
    /// The candidate this decision is about.
    pub candidate: RawCandidate,
    /// Whether the candidate proceeds to detail-page resolution.
    pub accepted: bool,
    /// Why the candidate was accepted or rejected.
    pub reason: String,
}

impl MatchDecision {
    fn accepted(candidate: RawCandidate, reason: &str) -> Self {
        Self {
            candidate,
            accepted: true,
            reason: reason.to_string(),
        }
    }

    fn rejected(candidate: RawCandidate, reason: &str) -> Self {
        Self {
            candidate,
            accepted: false,
            reason: reason.to_string(),
        }
    }
}

/// Normalizes text for containment comparison: lowercases, maps every
/// non-alphanumeric character to a space, collapses runs, and trims.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
#[must_use]
pub fn normalize(value: &str) -> String {
    let lowered = value.to_lowercase();
    NON_ALNUM_RE.replace_all(&lowered, " ").trim().to_string()
}

/// Filters raw candidates against the canonical title.
///
/// Candidates without a reference URL are dropped outright; the rest are
/// accepted when the normalized reference URL or label contains the
/// normalized canonical title as a substring.
#[must_use]
pub fn filter_and_match(
    candidates: Vec<RawCandidate>,
    canonical: &CanonicalMetadata,
) -> Vec<MatchDecision> {
    let needle = normalize(&canonical.title);

    candidates
        .into_iter()
        .map(|candidate| {
            let Some(reference_url) = candidate
                .reference_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
            else {
                debug!(label = %candidate.label, "Candidate has no reference URL");
                return MatchDecision::rejected(candidate, REASON_MISSING_REFERENCE_URL);
            };

            let reference_hay = normalize(reference_url);
            let label_hay = normalize(&candidate.label);
            let matched = !needle.is_empty()
                && (reference_hay.contains(&needle) || label_hay.contains(&needle));

            debug!(
                label = %candidate.label,
                reference_url,
                matched,
                "Candidate pre-filter decision"
            );

            if matched {
                MatchDecision::accepted(candidate, REASON_TITLE_CONTAINED)
            } else {
                MatchDecision::rejected(candidate, REASON_TITLE_NOT_CONTAINED)
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn canonical(title: &str, publisher: &str) -> CanonicalMetadata {
        CanonicalMetadata {
            identifier: "com.example.app".to_string(),
            title: title.to_string(),
            publisher: publisher.to_string(),
        }
    }

    fn candidate(label: &str, reference_url: Option<&str>) -> RawCandidate {
        RawCandidate {
            label: label.to_string(),
            reference_url: reference_url.map(String::from),
        }
    }

    #[test]
    fn test_normalize_lowercases_and_collapses() {
        assert_eq!(normalize("  Super   App  "), "super app");
        assert_eq!(normalize("super-app-pro-2.apk"), "super app pro 2 apk");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["Super App", "super-app-pro-2.apk", "  A  B  ", "", "---"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_reference_url_substring_match_accepted() {
        let decisions = filter_and_match(
            vec![candidate(
                "Super App Pro",
                Some("https://mirror.example/super-app-pro-2.apk"),
            )],
            &canonical("Super App", "Super Corporation"),
        );
        assert_eq!(decisions.len(), 1);
        assert!(decisions[0].accepted);
    }

    #[test]
    fn test_unrelated_reference_url_rejected_with_reason() {
        let decisions = filter_and_match(
            vec![candidate("Other App", Some("https://mirror.example/other-app.apk"))],
            &canonical("Super App", "Super Corporation"),
        );
        assert_eq!(decisions.len(), 1);
        assert!(!decisions[0].accepted);
        assert_eq!(decisions[0].reason, REASON_TITLE_NOT_CONTAINED);
    }

    #[test]
    fn test_label_match_accepted_when_url_does_not_contain_title() {
        let decisions = filter_and_match(
            vec![candidate("Super App (latest)", Some("https://mirror.example/d/98321"))],
            &canonical("Super App", "Super Corporation"),
        );
        assert!(decisions[0].accepted);
    }

    #[test]
    fn test_missing_reference_url_rejected() {
        let decisions = filter_and_match(
            vec![candidate("Super App", None), candidate("Super App", Some("  "))],
            &canonical("Super App", "Super Corporation"),
        );
        assert!(decisions.iter().all(|d| !d.accepted));
        assert!(
            decisions
                .iter()
                .all(|d| d.reason == REASON_MISSING_REFERENCE_URL)
        );
    }

    #[test]
    fn test_publisher_differences_do_not_filter() {
        // Mirror abbreviates "Corporation" to "Corp." - must not matter here.
        let decisions = filter_and_match(
            vec![candidate(
                "Super App by Super Corp.",
                Some("https://mirror.example/super-app.apk"),
            )],
            &canonical("Super App", "Super Corporation"),
        );
        assert!(decisions[0].accepted);
    }

    #[test]
    fn test_decisions_preserve_candidate_order() {
        let decisions = filter_and_match(
            vec![
                candidate("a", Some("https://m/super-app-1.apk")),
                candidate("b", None),
                candidate("c", Some("https://m/super-app-3.apk")),
            ],
            &canonical("Super App", "Super Corporation"),
        );
        let labels: Vec<&str> = decisions.iter().map(|d| d.candidate.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }
}
