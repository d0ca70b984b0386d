//! Deterministic pattern strategies.
//!
//! Both run over the full, untruncated page source and return the first
//! match in document order.

use std::sync::LazyLock;

use regex::Regex;

/// Strategy A: a known key or variable assigned a quoted `.mp3` URL.
static KEYED_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:streamURL|audioUrl|mp3Url)["']?\s*(?::|=)\s*["']([^"']+\.mp3[^"']*)["']"#)
        .expect("keyed assignment pattern is valid")
});

/// Strategy B: any absolute URL ending in `.mp3`.
///
/// The body excludes whitespace and `<>` as well as quotes, so it is narrower
/// than a quote-bounded match and never spans prose or tags.
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(https?://[^"'\s<>]+\.mp3)"#).expect("bare url pattern is valid")
});

/// Value assigned to `streamURL`, `audioUrl` or `mp3Url` (any case).
pub fn keyed_assignment(source: &str) -> Option<&str> {
    KEYED_ASSIGNMENT
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// First absolute `http(s)` URL ending in `.mp3`.
pub fn bare_url(source: &str) -> Option<&str> {
    BARE_URL
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
