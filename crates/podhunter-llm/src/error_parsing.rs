//! API error response parsing.
//!
//! Handles the error envelopes an inference endpoint (or a gateway in front
//! of it) may return:
//! - Google:   `{"error": {"code": 429, "message": "...", "status": "RESOURCE_EXHAUSTED"}}`
//! - Detail:   `{"detail": "..."}`
//! - Flat:     `{"message": "...", "code": "..."}`

use serde_json::Value;

/// Parsed API error information.
#[derive(Debug)]
pub struct ApiErrorInfo {
    /// Human-readable error message.
    pub message: String,
    /// Provider-specific error code (e.g. `"RESOURCE_EXHAUSTED"`).
    pub code: Option<String>,
    /// Whether the request can be retried (429 or 5xx).
    pub retryable: bool,
}

/// Parse an API error response body into structured error info.
///
/// Falls back to the raw body text if no known envelope matches.
pub fn parse_api_error(body: &str, status: u16) -> ApiErrorInfo {
    let retryable = status == 429 || status >= 500;

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return raw(body, status, retryable);
    };

    if let Some(msg) = json["error"]["message"].as_str() {
        let code = json["error"]["status"]
            .as_str()
            .or_else(|| json["error"]["type"].as_str())
            .map(String::from);
        return ApiErrorInfo {
            message: msg.to_string(),
            code,
            retryable,
        };
    }

    if let Some(msg) = json["detail"].as_str().or_else(|| json["message"].as_str()) {
        let code = json["code"].as_str().map(String::from);
        return ApiErrorInfo {
            message: msg.to_string(),
            code,
            retryable,
        };
    }

    raw(body, status, retryable)
}

fn raw(body: &str, status: u16, retryable: bool) -> ApiErrorInfo {
    ApiErrorInfo {
        message: format!("HTTP {status}: {}", podhunter_core::text::preview(body, 500)),
        code: None,
        retryable,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
