//! Errors surfaced by the binary.

use podhunter_core::UserFacing;
use podhunter_extract::ExtractError;
use podhunter_fetch::FetchError;
use podhunter_llm::ProviderError;
use podhunter_settings::SettingsError;
use podhunter_transcription::TranscriptionError;

/// Any pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Retrieval failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Inference client failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Extraction failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Transcription failed.
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    /// The page was analysed but holds no audio URL.
    #[error("no audio stream URL found on {url}")]
    NoStreamFound {
        /// Page that was scanned.
        url: String,
    },
}

impl PipelineError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoStreamFound { .. } => 2,
            _ => 1,
        }
    }
}

impl UserFacing for PipelineError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Settings(_) => Some(format!(
                "Fix or remove {}; every field is optional.",
                podhunter_settings::settings_path().display()
            )),
            Self::Fetch(e) => e.hint(),
            Self::Provider(e) => e.hint(),
            Self::Extract(e) => e.hint(),
            Self::Transcription(e) => e.hint(),
            Self::NoStreamFound { .. } => Some(
                "The page may load its player with JavaScript. Pass the audio URL to \
                 `podhunter download` directly if you can find it."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_exits_with_two() {
        let err = PipelineError::NoStreamFound {
            url: "https://show.example".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.hint().is_some());
    }

    #[test]
    fn hints_are_forwarded() {
        let err = PipelineError::from(TranscriptionError::Remote {
            message: "quota".into(),
            hint: Some("retry with --backend local".into()),
        });
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.hint().as_deref(), Some("retry with --backend local"));
        assert_eq!(err.to_string(), "remote transcription failed: quota");
    }

    #[test]
    fn exhausted_fetch_has_hint() {
        let err = PipelineError::from(FetchError::RetrievalExhausted {
            attempts: 4,
            last_error: "HTTP 403".into(),
        });
        assert!(err.hint().unwrap().contains("Try again later"));
    }
}
