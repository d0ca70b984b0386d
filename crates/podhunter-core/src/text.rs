//! UTF-8 safe string truncation.
//!
//! Page sources are capped before they are sent to a model. A plain
//! `&s[..n]` panics when `n` lands inside a multi-byte character, so the cap
//! snaps back to the nearest char boundary.

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
#[inline]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Shorten `s` for log output, appending `...` when it was cut.
pub fn preview(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    format!("{}...", truncate_str(s, max_bytes))
}
