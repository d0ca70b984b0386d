//! Transcription errors.

use podhunter_core::UserFacing;
use podhunter_fetch::FetchError;

/// Errors from a transcription job.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    /// The host cannot run the local engine.
    #[error("local transcription is not available on this host: {reason}")]
    LocalBridgeUnavailable {
        /// What is missing.
        reason: String,
    },

    /// The local engine failed, timed out or was cancelled.
    #[error("local transcription failed{}: {trace}", .exit_code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    LocalInferenceFailed {
        /// Exit code, when the process exited on its own.
        exit_code: Option<i32>,
        /// Diagnostic output from the engine.
        trace: String,
    },

    /// The local engine exited cleanly but its output was not understood.
    #[error("local transcription produced unreadable output: {raw}")]
    LocalBridgeOutputMalformed {
        /// Raw stdout (shortened).
        raw: String,
    },

    /// The audio payload could not be decoded.
    #[error("invalid audio payload: {0}")]
    InvalidPayload(String),

    /// Remote inference failed.
    #[error("remote transcription failed: {message}")]
    Remote {
        /// Underlying failure.
        message: String,
        /// Suggested alternative.
        hint: Option<String>,
    },

    /// The audio could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Temporary file handling failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UserFacing for TranscriptionError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::LocalBridgeUnavailable { .. } => Some(
                "Install the local engine with `podhunter setup-local`, then create its Python \
                 runtime with faster-whisper."
                    .into(),
            ),
            Self::LocalInferenceFailed { .. } | Self::LocalBridgeOutputMalformed { .. } => {
                Some("Run with --log-level debug to see the engine output.".into())
            }
            Self::Remote { hint, .. } => hint.clone(),
            Self::Fetch(e) => e.hint(),
            Self::InvalidPayload(_) | Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_failure_display() {
        let err = TranscriptionError::LocalInferenceFailed {
            exit_code: Some(1),
            trace: "model missing".into(),
        };
        assert_eq!(err.to_string(), "local transcription failed (exit code 1): model missing");

        let err = TranscriptionError::LocalInferenceFailed {
            exit_code: None,
            trace: "timed out".into(),
        };
        assert_eq!(err.to_string(), "local transcription failed: timed out");
    }

    #[test]
    fn local_hints_stay_local() {
        let err = TranscriptionError::LocalBridgeUnavailable {
            reason: "no script".into(),
        };
        assert!(err.hint().unwrap().contains("setup-local"));
        assert!(!err.hint().unwrap().contains("remote"));
    }

    #[test]
    fn remote_hint_is_forwarded() {
        let err = TranscriptionError::Remote {
            message: "quota".into(),
            hint: Some("use local".into()),
        };
        assert_eq!(err.hint().as_deref(), Some("use local"));
    }
}
