//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON file format.
//! Each type implements [`Default`] with production values, and
//! `#[serde(default)]` lets a settings file carry only the fields it changes.

mod network;
mod pipeline;

pub use network::*;
pub use pipeline::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// Loaded from `~/.podhunter/settings.json` with defaults applied for
/// missing fields. Environment variables can override specific values.
///
/// ```json
/// {
///   "gemini": { "models": ["gemini-2.5-flash"] },
///   "transcription": { "backend": "local", "modelSize": "small" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodhunterSettings {
    /// Endpoint-fallback fetcher settings.
    pub fetch: FetchSettings,
    /// Gemini inference service settings.
    pub gemini: GeminiSettings,
    /// Rate-limit retry settings.
    pub retry: RetrySettings,
    /// Extraction cascade settings.
    pub extraction: ExtractionSettings,
    /// Transcription dispatcher and local bridge settings.
    pub transcription: TranscriptionSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl PodhunterSettings {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.fetch.proxies.is_empty() {
            return Err(crate::SettingsError::InvalidValue(
                "fetch.proxies must list at least one proxy".into(),
            ));
        }
        if self.gemini.models.iter().all(|m| m.trim().is_empty()) {
            return Err(crate::SettingsError::InvalidValue(
                "gemini.models must list at least one model".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(crate::SettingsError::InvalidValue(
                "retry.maxAttempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}
