//! Fetcher error types.

use podhunter_core::UserFacing;

/// Errors raised while retrieving remote content.
///
/// Only [`FetchError::RetrievalExhausted`] escapes [`crate::Fetcher`]; the
/// other variants describe a single failed attempt and are folded into its
/// `last_error`.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Every configured path failed.
    #[error("all {attempts} retrieval attempts failed; last error: {last_error}")]
    RetrievalExhausted {
        /// Number of requests issued (direct attempt included).
        attempts: usize,
        /// Message of the most recent failure.
        last_error: String,
    },

    /// Connection, TLS, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Status code.
        status: u16,
        /// URL that was requested.
        url: String,
    },

    /// Success status with a blank text body.
    #[error("empty response body from {url}")]
    EmptyBody {
        /// URL that was requested.
        url: String,
    },

    /// Writing a downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RetrievalExhausted { .. } => "exhausted",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::EmptyBody { .. } => "empty_body",
            Self::Io(_) => "io",
        }
    }
}

impl UserFacing for FetchError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::RetrievalExhausted { .. } => Some(
                "The site may block automated access or the proxies are down. \
                 Try again later, or save the page and use the audio URL directly."
                    .into(),
            ),
            Self::Io(_) => Some("Check that the output directory exists and is writable.".into()),
            _ => None,
        }
    }
}
