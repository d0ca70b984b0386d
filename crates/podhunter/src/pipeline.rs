//! Component wiring.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use podhunter_extract::{Extraction, ExtractionCascade};
use podhunter_fetch::Fetcher;
use podhunter_llm::{CandidateCascade, GeminiClient, RateLimitRetry, ResilientCascade};
use podhunter_settings::{BackendPreference, PodhunterSettings};
use podhunter_transcription::{
    Dispatcher, HostCapability, LocalBridge, RemoteTranscriber, TranscriptionResult,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::PipelineError;

/// Every component of the pipeline, built once per invocation.
pub struct Pipeline {
    settings: PodhunterSettings,
    fetcher: Fetcher,
    models: ResilientCascade,
    extractor: ExtractionCascade,
    dispatcher: Dispatcher,
}

impl Pipeline {
    /// Build the pipeline. `cancel` aborts cooldowns and local engine runs.
    pub fn new(settings: PodhunterSettings, cancel: &CancellationToken) -> Result<Self, PipelineError> {
        let gemini = GeminiClient::new(&settings.gemini)?;
        if !gemini.has_api_key() {
            debug!("no Gemini API key configured; remote inference will fail");
        }
        let cascade = CandidateCascade::new(Arc::new(gemini), settings.gemini.models.clone());

        // Extraction has pattern fallbacks, so it calls the cascade without cooldowns.
        let fetcher = Fetcher::from_settings(&settings.fetch)?;
        let extractor = ExtractionCascade::new(
            Arc::new(cascade.clone()),
            settings.extraction.max_source_chars,
        );

        let retry = RateLimitRetry::from_settings(&settings.retry).with_cancel_token(cancel.clone());
        let models = ResilientCascade::new(cascade, retry);

        let capability = HostCapability::detect(&settings.transcription);
        let local = LocalBridge::from_settings(&settings.transcription)
            .with_cancel_token(cancel.clone());
        let remote = RemoteTranscriber::new(models.clone());
        let dispatcher = Dispatcher::new(fetcher.clone(), Arc::new(remote), Arc::new(local), capability);
        info!(
            proxies = fetcher.chain().len(),
            candidates = models.cascade().candidates().len(),
            local_bridge = capability.local_bridge,
            "pipeline ready"
        );

        Ok(Self {
            settings,
            fetcher,
            models,
            extractor,
            dispatcher,
        })
    }

    /// Find the stream URL on an episode page.
    pub async fn scan(&self, url: &str) -> Result<Extraction, PipelineError> {
        let source = self.fetcher.fetch_page_source(url).await?;
        self.extractor
            .extract_target_url(&source)
            .await?
            .ok_or_else(|| PipelineError::NoStreamFound {
                url: url.to_string(),
            })
    }

    /// Download audio into `out_dir`.
    pub async fn download(
        &self,
        url: &str,
        out_dir: &Path,
        name: Option<&str>,
    ) -> Result<PathBuf, PipelineError> {
        Ok(self.fetcher.download_to(url, out_dir, name).await?)
    }

    /// Transcribe audio at `url`.
    pub async fn transcribe_url(
        &self,
        url: &str,
        backend: Option<BackendPreference>,
        model_size: Option<&str>,
    ) -> Result<TranscriptionResult, PipelineError> {
        let (backend, model_size) = self.job_options(backend, model_size);
        Ok(self
            .dispatcher
            .transcribe_url(url, backend, model_size)
            .await?)
    }

    /// Transcribe audio bytes read by the caller.
    pub async fn transcribe_bytes(
        &self,
        audio: &[u8],
        backend: Option<BackendPreference>,
        model_size: Option<&str>,
    ) -> Result<TranscriptionResult, PipelineError> {
        let (backend, model_size) = self.job_options(backend, model_size);
        Ok(self
            .dispatcher
            .transcribe_bytes(audio, backend, model_size)
            .await?)
    }

    /// Models available to the configured key.
    pub async fn available_models(&self) -> Result<Vec<String>, PipelineError> {
        Ok(self.models.cascade().list_models().await?)
    }

    /// Configured candidate models, in priority order.
    pub fn candidates(&self) -> &[String] {
        self.models.cascade().candidates()
    }

    fn job_options<'a>(
        &'a self,
        backend: Option<BackendPreference>,
        model_size: Option<&'a str>,
    ) -> (BackendPreference, &'a str) {
        (
            backend.unwrap_or(self.settings.transcription.backend),
            model_size.unwrap_or(&self.settings.transcription.model_size),
        )
    }
}
