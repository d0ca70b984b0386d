//! Extraction cascade.
//!
//! The model path runs first over a size-capped copy of the page. A usable
//! positive verdict wins. Anything else (a clean `found: false`, a blank url,
//! a reply that breaks the schema, or a model error) falls through to the
//! pattern strategies, which always see the full source.
//!
//! Only a model error followed by two empty pattern searches is an error;
//! every other miss is `Ok(None)`.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use podhunter_core::text::truncate_str;
use podhunter_llm::{CandidateCascade, GenerateRequest, ProviderError};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::errors::ExtractError;
use crate::patterns;
use crate::verdict::{Confidence, ExtractionVerdict, response_schema};

/// Produces a JSON reply constrained by a schema.
///
/// Implemented for the bare [`CandidateCascade`]: a throttled model is
/// one more failed strategy here, never a cooldown.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Run `prompt` and return the raw reply text.
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String, ProviderError>;
}

#[async_trait]
impl StructuredGenerator for CandidateCascade {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String, ProviderError> {
        let request = GenerateRequest::text(prompt).with_schema(schema.clone());
        self.invoke(&request).await.map(|r| r.text)
    }
}

/// Which strategy produced a URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Model verdict.
    Model {
        /// Self-reported confidence, when given.
        confidence: Option<Confidence>,
    },
    /// Pattern A: known key assigned a quoted `.mp3` value.
    KeyedAssignment,
    /// Pattern B: first absolute `.mp3` URL.
    BareUrl,
}

/// An extracted stream URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    /// The URL.
    pub url: String,
    /// Strategy that found it.
    pub strategy: Strategy,
}

/// Model-first URL extraction with deterministic fallback.
#[derive(Clone)]
pub struct ExtractionCascade {
    generator: Arc<dyn StructuredGenerator>,
    max_source_chars: usize,
}

impl ExtractionCascade {
    /// Cascade over `generator`, capping model input at `max_source_chars` bytes.
    pub fn new(generator: Arc<dyn StructuredGenerator>, max_source_chars: usize) -> Self {
        Self {
            generator,
            max_source_chars,
        }
    }

    /// Find the audio stream URL in a page source.
    #[instrument(skip_all, fields(source_len = source.len()))]
    pub async fn extract_target_url(
        &self,
        source: &str,
    ) -> Result<Option<Extraction>, ExtractError> {
        let capped = truncate_str(source, self.max_source_chars);
        if capped.len() < source.len() {
            debug!(kept = capped.len(), "page source truncated for model");
        }

        let prompt = extraction_prompt(capped);
        let model_error = match self.generator.generate_json(&prompt, &response_schema()).await {
            Ok(reply) => {
                match ExtractionVerdict::parse(&reply) {
                    Ok(verdict) => {
                        if let Some(url) = verdict.usable_url() {
                            counter!("extractions_total", "strategy" => "model").increment(1);
                            info!(confidence = ?verdict.confidence, "model found stream url");
                            return Ok(Some(Extraction {
                                url: url.to_string(),
                                strategy: Strategy::Model {
                                    confidence: verdict.confidence,
                                },
                            }));
                        }
                        debug!("model reported no usable url, trying patterns");
                    }
                    Err(e) => warn!(error = %e, "model reply failed schema validation, trying patterns"),
                }
                None
            }
            Err(e) => {
                warn!(category = %e.category(), error = %e, "model analysis failed, trying patterns");
                Some(e)
            }
        };

        if let Some(found) = match_patterns(source) {
            return Ok(Some(found));
        }

        counter!("extractions_total", "strategy" => "none").increment(1);
        match model_error {
            Some(e) => Err(ExtractError::AnalysisFailed {
                model_error: e.to_string(),
            }),
            None => Ok(None),
        }
    }
}

fn match_patterns(source: &str) -> Option<Extraction> {
    if let Some(url) = patterns::keyed_assignment(source) {
        counter!("extractions_total", "strategy" => "keyed_assignment").increment(1);
        info!("keyed assignment pattern found stream url");
        return Some(Extraction {
            url: url.to_string(),
            strategy: Strategy::KeyedAssignment,
        });
    }
    patterns::bare_url(source).map(|url| {
        counter!("extractions_total", "strategy" => "bare_url").increment(1);
        info!("bare url pattern found stream url");
        Extraction {
            url: url.to_string(),
            strategy: Strategy::BareUrl,
        }
    })
}

fn extraction_prompt(source: &str) -> String {
    format!(
        "You extract audio stream URLs from web page source.\n\
         \n\
         1. Look for a variable, JSON key or assignment named \"streamURL\", for example \
         \"streamURL\": \"http...\", var streamURL = '...' or streamURL: '...'.\n\
         2. Return the full URL value assigned to it.\n\
         3. If there is no streamURL, look for any other value that is clearly an MP3 \
         audio stream URL.\n\
         4. Reply with JSON only: found, url and confidence (Low, Medium or High).\n\
         \n\
         SOURCE:\n```html\n{source}\n```\n"
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
