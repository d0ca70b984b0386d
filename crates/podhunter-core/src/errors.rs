//! Error classification shared across the pipeline.
//!
//! Upstream services report failures as free text as often as they report
//! structured codes. [`classify_message`] maps a raw message onto an
//! [`ErrorCategory`] using an ordered pattern table; the first matching
//! pattern wins. The retry controller relies on [`is_rate_limit_message`] to
//! spot throttling that did not arrive as a typed 429.
//!
//! [`UserFacing`] is implemented by every error that can reach the CLI so the
//! binary can print a hint instead of a raw error chain.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse classification of an upstream failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Provider throttled the caller.
    RateLimit,
    /// Credentials missing or rejected.
    Authentication,
    /// Requested model or resource does not exist.
    NotFound,
    /// Connection level failure.
    Network,
    /// Upstream returned a 5xx.
    Server,
    /// Anything else.
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RateLimit => "rate_limit",
            Self::Authentication => "authentication",
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::Server => "server",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

struct ErrorPattern {
    check: fn(&str) -> bool,
    category: ErrorCategory,
}

// Order matters: "429" must be checked before the generic status patterns.
static PATTERNS: &[ErrorPattern] = &[
    ErrorPattern {
        check: |s| s.contains("429"),
        category: ErrorCategory::RateLimit,
    },
    ErrorPattern {
        check: |s| s.to_uppercase().contains("RESOURCE_EXHAUSTED"),
        category: ErrorCategory::RateLimit,
    },
    ErrorPattern {
        check: |s| s.to_lowercase().contains("too many requests"),
        category: ErrorCategory::RateLimit,
    },
    ErrorPattern {
        check: |s| s.contains("401") || s.to_uppercase().contains("API_KEY_INVALID"),
        category: ErrorCategory::Authentication,
    },
    ErrorPattern {
        check: |s| s.contains("403") || s.to_uppercase().contains("PERMISSION_DENIED"),
        category: ErrorCategory::Authentication,
    },
    ErrorPattern {
        check: |s| s.contains("404") || s.to_lowercase().contains("not found"),
        category: ErrorCategory::NotFound,
    },
    ErrorPattern {
        check: |s| {
            let lower = s.to_lowercase();
            lower.contains("timed out") || lower.contains("connection") || lower.contains("dns")
        },
        category: ErrorCategory::Network,
    },
    ErrorPattern {
        check: |s| ["500", "502", "503", "504"].iter().any(|code| s.contains(code)),
        category: ErrorCategory::Server,
    },
];

/// Classify a raw error message.
pub fn classify_message(message: &str) -> ErrorCategory {
    PATTERNS
        .iter()
        .find(|p| (p.check)(message))
        .map_or(ErrorCategory::Unknown, |p| p.category)
}

/// Whether a raw error message signals provider throttling.
pub fn is_rate_limit_message(message: &str) -> bool {
    classify_message(message) == ErrorCategory::RateLimit
}

/// An error that can be shown to an end user.
pub trait UserFacing: std::error::Error {
    /// Actionable next step for the user, if there is one.
    fn hint(&self) -> Option<String>;
}
