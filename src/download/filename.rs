//! Filename sanitization and installer naming.
//!
//! Title and version values arrive verbatim from extraction; this module
//! is the collaborator responsible for making them filesystem-safe.

use std::path::{Component, Path};

/// Builds the installer filename for a resolved listing:
/// `<title>-<version>.apk`, with each component sanitized.
#[must_use]
pub fn installer_filename(title: &str, version: &str) -> String {
    format!(
        "{}-{}.apk",
        sanitize_filename(title),
        sanitize_filename(version)
    )
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > | and control characters. Dot-only segments are
/// rewritten so the result can never escape its directory.
#[must_use]
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
