//! # Model Backend
//!
//! Provider-neutral request/response types, the [`ModelBackend`] seam every
//! inference service implements, and the shared [`ProviderError`].

use async_trait::async_trait;
use podhunter_core::{ErrorCategory, UserFacing, classify_message, is_rate_limit_message};
use serde_json::Value;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur during provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication failed (missing or invalid key).
    #[error("Auth error: {message}")]
    Auth {
        /// Error description.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("Rate limited (429): {message}")]
    RateLimited {
        /// Suggested retry delay in milliseconds, 0 when not given.
        retry_after_ms: u64,
        /// Error description.
        message: String,
    },

    /// Still rate limited after the final retry.
    #[error("upstream service unavailable after {attempts} attempts: {message}")]
    RetriesExhausted {
        /// Attempts made, first call included.
        attempts: u32,
        /// Message of the last failure.
        message: String,
    },

    /// Provider returned an API error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
        /// Provider-specific error code.
        code: Option<String>,
        /// Whether this error can be retried.
        retryable: bool,
    },

    /// Successful status but no usable text in the response.
    #[error("model {model} returned no text")]
    EmptyResponse {
        /// Model that answered.
        model: String,
    },

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Provider-specific error.
    #[error("{message}")]
    Other {
        /// Error description.
        message: String,
    },
}

impl ProviderError {
    /// Whether this error signals provider throttling.
    ///
    /// Typed 429s are recognised directly; anything else is matched on its
    /// message so throttling reported as free text is caught too.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } if *status == 429 => true,
            Self::Http(e) if e.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) => true,
            Self::RetriesExhausted { .. } | Self::Cancelled | Self::Auth { .. } => false,
            other => is_rate_limit_message(&other.to_string()),
        }
    }

    /// Coarse category for logs and metrics.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RateLimited { .. } | Self::RetriesExhausted { .. } => ErrorCategory::RateLimit,
            Self::Auth { .. } => ErrorCategory::Authentication,
            Self::Http(e) if e.is_timeout() || e.is_connect() => ErrorCategory::Network,
            Self::Cancelled => ErrorCategory::Unknown,
            other => classify_message(&other.to_string()),
        }
    }
}

impl UserFacing for ProviderError {
    fn hint(&self) -> Option<String> {
        match self.category() {
            ErrorCategory::RateLimit => Some(
                "The inference service is throttling requests. Wait a minute and try again."
                    .into(),
            ),
            ErrorCategory::Authentication => Some(
                "Set PODHUNTER_GEMINI_API_KEY (or GEMINI_API_KEY) to a valid API key.".into(),
            ),
            ErrorCategory::NotFound => {
                Some("Check the candidate list in gemini.models of your settings file.".into())
            }
            ErrorCategory::Network => Some("Check your network connection.".into()),
            ErrorCategory::Server | ErrorCategory::Unknown => None,
        }
    }
}

/// One part of a model request.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestPart {
    /// Plain text.
    Text(String),
    /// Base64 payload with its MIME type.
    InlineData {
        /// MIME type, e.g. `audio/mp3`.
        mime_type: String,
        /// Base64-encoded bytes.
        data: String,
    },
}

/// A single-turn generation request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerateRequest {
    /// User turn parts, in order.
    pub parts: Vec<RequestPart>,
    /// JSON schema constraining the response. Implies a JSON response.
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    /// Request with a single text part.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![RequestPart::Text(prompt.into())],
            response_schema: None,
        }
    }

    /// Constrain the response to `schema`.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Generated text and the model that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateResponse {
    /// Concatenated response text.
    pub text: String,
    /// Model identifier that answered.
    pub model: String,
}

/// An inference service addressed by model identifier.
///
/// Implementors must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run `request` against `model`.
    async fn generate(&self, model: &str, request: &GenerateRequest)
    -> ProviderResult<GenerateResponse>;

    /// Model identifiers the current credentials can use.
    ///
    /// Backends without a catalog return an empty list.
    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        Ok(Vec::new())
    }
}
