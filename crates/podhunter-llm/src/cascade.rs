//! # Candidate Cascade
//!
//! Walks an ordered list of model identifiers and returns the first success.
//! Every failure moves on to the next candidate, quota errors included,
//! because each model has its own quota. There is no sleeping here; time-based
//! backoff belongs to [`crate::retry::RateLimitRetry`], applied around a whole
//! invocation.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use crate::provider::{GenerateRequest, GenerateResponse, ModelBackend, ProviderError, ProviderResult};

/// Ordered model fallback over a single backend.
#[derive(Clone)]
pub struct CandidateCascade {
    backend: Arc<dyn ModelBackend>,
    candidates: Vec<String>,
}

impl CandidateCascade {
    /// Cascade over `candidates`, highest priority first. Blank entries are dropped.
    pub fn new(backend: Arc<dyn ModelBackend>, candidates: Vec<String>) -> Self {
        let candidates = candidates
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self {
            backend,
            candidates,
        }
    }

    /// Candidate identifiers in priority order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Models available from the backend, for diagnostics.
    pub async fn list_models(&self) -> ProviderResult<Vec<String>> {
        self.backend.list_models().await
    }

    /// Try each candidate once, in order; return the first success or the
    /// last error.
    pub async fn invoke(&self, request: &GenerateRequest) -> ProviderResult<GenerateResponse> {
        let mut last_error = None;

        for (index, model) in self.candidates.iter().enumerate() {
            match self.backend.generate(model, request).await {
                Ok(response) => {
                    counter!("cascade_attempts_total", "outcome" => "success").increment(1);
                    info!(model = %model, index, "candidate succeeded");
                    return Ok(response);
                }
                Err(e) => {
                    counter!("cascade_attempts_total", "outcome" => "failure").increment(1);
                    warn!(
                        model = %model,
                        index,
                        category = %e.category(),
                        error = %e,
                        "candidate failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Other {
            message: "no candidate models configured".into(),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
