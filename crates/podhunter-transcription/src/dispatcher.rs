//! # Transcription Dispatcher
//!
//! Routes one transcription job to exactly one backend. The backend is fixed
//! when the job is created and never changes: a failed remote job is not
//! retried locally and vice versa. Job progress is traced through a
//! `transcription` span carrying the job id and backend.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use metrics::counter;
use podhunter_fetch::Fetcher;
use podhunter_settings::BackendPreference;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::capability::{Backend, HostCapability, select_backend};
use crate::errors::TranscriptionError;

/// Returned in place of an empty transcript.
pub const EMPTY_TRANSCRIPT: &str = "No transcription available.";

/// A transcription backend.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe base64 audio. `model_size` is ignored by backends that
    /// do not use it.
    async fn transcribe(
        &self,
        audio_base64: &str,
        model_size: &str,
    ) -> Result<String, TranscriptionError>;
}

/// One unit of transcription work.
#[derive(Clone, Debug)]
pub struct TranscriptionJob {
    /// Job identifier, used in logs.
    pub id: Uuid,
    /// Base64 audio.
    pub audio_base64: String,
    /// Backend the job runs on.
    pub backend: Backend,
    /// Local engine model size.
    pub model_size: String,
}

impl TranscriptionJob {
    /// New job with a fresh id.
    pub fn new(audio_base64: String, backend: Backend, model_size: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            audio_base64,
            backend,
            model_size: model_size.into(),
        }
    }
}

/// A finished transcription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptionResult {
    /// Transcript text.
    pub text: String,
    /// Backend that produced it.
    pub backend: Backend,
    /// Job that produced it.
    pub job_id: Uuid,
}

/// Chooses a backend per job and runs it.
#[derive(Clone)]
pub struct Dispatcher {
    fetcher: Fetcher,
    remote: Arc<dyn Transcriber>,
    local: Arc<dyn Transcriber>,
    capability: HostCapability,
}

impl Dispatcher {
    /// Dispatcher over both backends and a probed host capability.
    pub fn new(
        fetcher: Fetcher,
        remote: Arc<dyn Transcriber>,
        local: Arc<dyn Transcriber>,
        capability: HostCapability,
    ) -> Self {
        Self {
            fetcher,
            remote,
            local,
            capability,
        }
    }

    /// What this host can run.
    pub fn capability(&self) -> HostCapability {
        self.capability
    }

    /// Backend for `preference`. An explicit local preference on a host
    /// without the engine fails here, before any audio is retrieved.
    pub fn select(&self, preference: BackendPreference) -> Result<Backend, TranscriptionError> {
        let backend = select_backend(self.capability, preference);
        if backend == Backend::Local && !self.capability.local_bridge {
            return Err(TranscriptionError::LocalBridgeUnavailable {
                reason: "the local engine was requested but is not installed".into(),
            });
        }
        Ok(backend)
    }

    /// Retrieve audio from `url` and transcribe it.
    pub async fn transcribe_url(
        &self,
        url: &str,
        preference: BackendPreference,
        model_size: &str,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let backend = self.select(preference)?;
        let audio_base64 = self.fetcher.fetch_audio_base64(url).await?;
        self.dispatch(TranscriptionJob::new(audio_base64, backend, model_size))
            .await
    }

    /// Transcribe audio already in memory.
    pub async fn transcribe_bytes(
        &self,
        audio: &[u8],
        preference: BackendPreference,
        model_size: &str,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let backend = self.select(preference)?;
        let audio_base64 = base64::engine::general_purpose::STANDARD.encode(audio);
        self.dispatch(TranscriptionJob::new(audio_base64, backend, model_size))
            .await
    }

    /// Run `job` on its backend.
    pub async fn dispatch(
        &self,
        job: TranscriptionJob,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let span = info_span!(
            "transcription",
            job_id = %job.id,
            backend = %job.backend
        );
        self.run(job).instrument(span).await
    }

    async fn run(&self, job: TranscriptionJob) -> Result<TranscriptionResult, TranscriptionError> {
        info!(bytes = job.audio_base64.len(), "transcription started");
        let backend = job.backend;
        let transcriber = match backend {
            Backend::Remote => &self.remote,
            Backend::Local => &self.local,
        };
        info!(model_size = %job.model_size, "backend selected");

        match transcriber
            .transcribe(&job.audio_base64, &job.model_size)
            .await
        {
            Ok(text) => {
                counter!("transcriptions_total", "backend" => backend.to_string(), "outcome" => "success")
                    .increment(1);
                let text = if text.trim().is_empty() {
                    EMPTY_TRANSCRIPT.to_string()
                } else {
                    text
                };
                info!(chars = text.len(), "transcription completed");
                Ok(TranscriptionResult {
                    text,
                    backend,
                    job_id: job.id,
                })
            }
            Err(e) => {
                counter!("transcriptions_total", "backend" => backend.to_string(), "outcome" => "failure")
                    .increment(1);
                error!(error = %e, "transcription failed");
                Err(self.with_local_hint(e))
            }
        }
    }

    /// Point remote failures at the local backend.
    fn with_local_hint(&self, error: TranscriptionError) -> TranscriptionError {
        let TranscriptionError::Remote { message, hint } = error else {
            return error;
        };
        let local = if self.capability.local_bridge {
            "The local engine is installed on this host: retry with --backend local."
        } else {
            "Install the local engine (`podhunter setup-local`) to transcribe without the remote service."
        };
        let hint = match hint {
            Some(existing) => format!("{existing} {local}"),
            None => local.to_string(),
        };
        TranscriptionError::Remote {
            message,
            hint: Some(hint),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
