//! Remote transcription through the inference cascade.

use async_trait::async_trait;
use metrics::counter;
use podhunter_core::{ErrorCategory, UserFacing};
use podhunter_llm::{GenerateRequest, ProviderError, RequestPart, ResilientCascade};
use tracing::{info, instrument, warn};

use crate::dispatcher::Transcriber;
use crate::errors::TranscriptionError;

const AUDIO_MIME_TYPE: &str = "audio/mp3";

/// Models named in a not-found report.
const LISTED_MODELS: usize = 10;

const TRANSCRIBE_INSTRUCTION: &str = "Transcribe the spoken content of this audio file. \
Write it as readable paragraphs with punctuation. When more than one person speaks, start \
each new speaker turn on its own line. Do not add timestamps, summaries or commentary; \
return only the transcript.";

/// Sends audio inline to the remote model cascade.
#[derive(Clone)]
pub struct RemoteTranscriber {
    cascade: ResilientCascade,
}

impl RemoteTranscriber {
    /// Transcriber over an assembled cascade.
    pub fn new(cascade: ResilientCascade) -> Self {
        Self { cascade }
    }

    /// Transcribe base64 audio remotely.
    #[instrument(skip_all)]
    pub async fn transcribe(&self, audio_base64: &str) -> Result<String, TranscriptionError> {
        let request = transcription_request(audio_base64);
        match self.cascade.generate(&request).await {
            Ok(response) => {
                info!(model = %response.model, chars = response.text.len(), "remote transcription done");
                counter!("remote_transcriptions_total", "outcome" => "success").increment(1);
                Ok(response.text)
            }
            Err(e) => {
                counter!("remote_transcriptions_total", "outcome" => "failure").increment(1);
                warn!(category = %e.category(), error = %e, "remote transcription failed");
                Err(self.describe_failure(&e).await)
            }
        }
    }

    async fn describe_failure(&self, error: &ProviderError) -> TranscriptionError {
        let mut message = error.to_string();
        if error.category() == ErrorCategory::NotFound {
            match self.cascade.cascade().list_models().await {
                Ok(models) if !models.is_empty() => {
                    let shown: Vec<&str> =
                        models.iter().take(LISTED_MODELS).map(String::as_str).collect();
                    message.push_str(&format!(
                        ". Available models for your key: {}",
                        shown.join(", ")
                    ));
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "could not list models"),
            }
        }
        TranscriptionError::Remote {
            message,
            hint: error.hint(),
        }
    }
}

#[async_trait]
impl Transcriber for RemoteTranscriber {
    async fn transcribe(
        &self,
        audio_base64: &str,
        _model_size: &str,
    ) -> Result<String, TranscriptionError> {
        RemoteTranscriber::transcribe(self, audio_base64).await
    }
}

fn transcription_request(audio_base64: &str) -> GenerateRequest {
    GenerateRequest {
        parts: vec![
            RequestPart::InlineData {
                mime_type: AUDIO_MIME_TYPE.into(),
                data: audio_base64.trim().to_string(),
            },
            RequestPart::Text(TRANSCRIBE_INSTRUCTION.into()),
        ],
        response_schema: None,
    }
}
