//! Identifier Resolver
//!
//! Extracts a canonical 11-character content ID from a user-supplied
//! reference string. Pure and deterministic; no I/O.

use std::sync::LazyLock;

use regex::Regex;

use super::{ContentRef, CoreError, CoreResult};

/// Ordered pattern matchers: standard URL form, short-link form, embed form,
/// shorts form. The first match wins.
static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:v=|/)([0-9A-Za-z_-]{11})(?:[?&#]|$)",
        r"youtu\.be/([0-9A-Za-z_-]{11})",
        r"embed/([0-9A-Za-z_-]{11})",
        r"shorts/([0-9A-Za-z_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern must compile"))
    .collect()
});

/// Resolves a reference string into a `ContentRef`.
///
/// Returns `CoreError::InvalidReference` when no matcher finds an
/// 11-character token in the allowed alphabet (`[0-9A-Za-z_-]`).
pub fn resolve(reference: &str) -> CoreResult<ContentRef> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidReference(
            "empty reference string".to_string(),
        ));
    }

    for pattern in PATTERNS.iter() {
        if let Some(captures) = pattern.captures(trimmed) {
            if let Some(id) = captures.get(1) {
                return Ok(ContentRef::new(trimmed, id.as_str()));
            }
        }
    }

    Err(CoreError::InvalidReference(format!(
        "no 11-character content token found in '{}'",
        trimmed
    )))
}
