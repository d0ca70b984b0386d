//! Extraction and transcription settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Extraction cascade settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionSettings {
    /// Page source is cut to this many bytes before it is sent to a model.
    pub max_source_chars: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_source_chars: 500_000,
        }
    }
}

/// Which transcription backend a job should use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Local when the host has the bridge, otherwise remote.
    #[default]
    Auto,
    /// Always the remote inference service.
    Remote,
    /// Always the local subprocess engine.
    Local,
}

impl FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "remote" | "cloud" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown backend '{other}' (expected auto, remote or local)")),
        }
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Remote => "remote",
            Self::Local => "local",
        })
    }
}

/// Transcription dispatcher and local bridge settings.
///
/// Relative paths are resolved against `~/.podhunter`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptionSettings {
    /// Backend selection policy.
    pub backend: BackendPreference,
    /// Whisper model size passed to the local engine.
    pub model_size: String,
    /// Interpreter used when no dedicated runtime is installed.
    pub interpreter: String,
    /// Transcription script run by the interpreter.
    pub script_path: String,
    /// Directory holding the dedicated runtime (`venv/`).
    pub runtime_dir: String,
    /// Directory holding bundled helper binaries (`bin/ffmpeg`).
    pub resources_dir: String,
    /// Deadline for one local transcription, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            model_size: "base".to_string(),
            interpreter: "python3".to_string(),
            script_path: "runtime/transcribe.py".to_string(),
            runtime_dir: "runtime".to_string(),
            resources_dir: "resources".to_string(),
            timeout_ms: 1_800_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_from_str() {
        assert_eq!("LOCAL".parse::<BackendPreference>(), Ok(BackendPreference::Local));
        assert_eq!("cloud".parse::<BackendPreference>(), Ok(BackendPreference::Remote));
        assert_eq!(" auto ".parse::<BackendPreference>(), Ok(BackendPreference::Auto));
        assert!("gpu".parse::<BackendPreference>().is_err());
    }

    #[test]
    fn backend_wire_format() {
        let json = serde_json::to_string(&BackendPreference::Remote).unwrap();
        assert_eq!(json, "\"remote\"");
    }

    #[test]
    fn default_model_size_is_base() {
        assert_eq!(TranscriptionSettings::default().model_size, "base");
    }
}
