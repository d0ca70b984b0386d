//! Fetcher, Gemini and retry settings.

use serde::{Deserialize, Serialize};

/// How a proxy embeds the target URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProxyStyle {
    /// Percent-encode the target and append it to the prefix.
    EncodedQuery,
    /// Append the target verbatim to the prefix.
    RawPath,
}

/// One relay in the ordered proxy chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEndpoint {
    /// Short label used in logs.
    pub name: String,
    /// URL prefix the target is appended to.
    pub prefix: String,
    /// How the target is embedded.
    pub style: ProxyStyle,
}

impl ProxyEndpoint {
    fn new(name: &str, prefix: &str, style: ProxyStyle) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            style,
        }
    }
}

/// Default proxy chain, most reliable first.
pub fn default_proxies() -> Vec<ProxyEndpoint> {
    vec![
        ProxyEndpoint::new(
            "allorigins",
            "https://api.allorigins.win/raw?url=",
            ProxyStyle::EncodedQuery,
        ),
        ProxyEndpoint::new("corsproxy", "https://corsproxy.io/?", ProxyStyle::EncodedQuery),
        ProxyEndpoint::new(
            "codetabs",
            "https://api.codetabs.com/v1/proxy?quest=",
            ProxyStyle::EncodedQuery,
        ),
        ProxyEndpoint::new(
            "thingproxy",
            "https://thingproxy.freeboard.io/fetch/",
            ProxyStyle::RawPath,
        ),
    ]
}

/// Endpoint-fallback fetcher settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchSettings {
    /// Per-request deadline in milliseconds.
    pub timeout_ms: u64,
    /// User agent sent on every request.
    pub user_agent: String,
    /// Ordered proxy chain.
    pub proxies: Vec<ProxyEndpoint>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: format!("podhunter/{}", env!("CARGO_PKG_VERSION")),
            proxies: default_proxies(),
        }
    }
}

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini inference service settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiSettings {
    /// API key. Usually supplied through the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Candidate models, highest priority first.
    pub models: Vec<String>,
    /// Per-request deadline in milliseconds. Audio uploads are large.
    pub timeout_ms: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            models: vec![
                "gemini-2.5-flash".to_string(),
                "gemini-2.5-flash-lite".to_string(),
                "gemini-2.0-flash".to_string(),
                "gemini-2.0-flash-lite".to_string(),
                "gemini-2.5-pro".to_string(),
            ],
            timeout_ms: 300_000,
        }
    }
}

/// Rate-limit retry settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrySettings {
    /// Cooldown before the single retry, in milliseconds.
    pub cooldown_ms: u64,
    /// Total attempts including the first one.
    pub max_attempts: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            // typical provider window is ~30s
            cooldown_ms: 35_000,
            max_attempts: 2,
        }
    }
}
