//! Extraction errors.

use podhunter_core::UserFacing;

/// Extraction failure.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The model path errored and no pattern matched either.
    #[error("analysis failed (model error: {model_error}); no audio URL found in the page")]
    AnalysisFailed {
        /// Message of the model failure.
        model_error: String,
    },
}

impl UserFacing for ExtractError {
    fn hint(&self) -> Option<String> {
        Some(
            "Open the page in a browser, copy the audio link by hand and pass it to \
             `podhunter download` or `podhunter transcribe`."
                .into(),
        )
    }
}
