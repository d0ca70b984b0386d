//! # Rate-Limit Retry
//!
//! Wraps one fallible remote operation, usually a whole
//! [`CandidateCascade`](crate::cascade::CandidateCascade) invocation.
//!
//! 1. Runs the operation
//! 2. A non-rate-limit error is returned immediately
//! 3. On the first rate limit, waits a fixed cooldown and runs it once more
//! 4. A rate limit on the final attempt becomes [`ProviderError::RetriesExhausted`]
//!
//! The wait goes through the [`Sleeper`] seam and can be aborted by a
//! `CancellationToken`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use podhunter_settings::RetrySettings;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cascade::CandidateCascade;
use crate::provider::{GenerateRequest, GenerateResponse, ProviderError, ProviderResult};

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Sleep for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeper.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bounded retry on provider throttling.
#[derive(Clone)]
pub struct RateLimitRetry {
    cooldown: Duration,
    max_attempts: u32,
    sleeper: Arc<dyn Sleeper>,
    cancel_token: Option<CancellationToken>,
}

impl RateLimitRetry {
    /// Retry controller with a real sleeper.
    pub fn new(cooldown: Duration, max_attempts: u32) -> Self {
        Self {
            cooldown,
            max_attempts: max_attempts.max(1),
            sleeper: Arc::new(TokioSleeper),
            cancel_token: None,
        }
    }

    /// Retry controller from settings.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            Duration::from_millis(settings.cooldown_ms),
            settings.max_attempts,
        )
    }

    /// Replace the sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Abort the cooldown when `token` is cancelled.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Run `op`, retrying after a cooldown when it is rate limited.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> ProviderResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_rate_limit() {
                return Err(err);
            }

            if attempt >= self.max_attempts {
                counter!("provider_retries_exhausted_total").increment(1);
                warn!(attempt, error = %err, "still rate limited, giving up");
                return Err(ProviderError::RetriesExhausted {
                    attempts: attempt,
                    message: err.to_string(),
                });
            }

            counter!("provider_retries_total", "category" => "rate_limit").increment(1);
            warn!(
                attempt,
                cooldown_ms = u64::try_from(self.cooldown.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "rate limited, cooling down before retry"
            );

            if let Some(ref token) = self.cancel_token {
                if token.is_cancelled() {
                    return Err(ProviderError::Cancelled);
                }
                tokio::select! {
                    () = self.sleeper.sleep(self.cooldown) => {}
                    () = token.cancelled() => return Err(ProviderError::Cancelled),
                }
            } else {
                self.sleeper.sleep(self.cooldown).await;
            }
        }
    }
}

/// A candidate cascade run under the rate-limit retry controller.
#[derive(Clone)]
pub struct ResilientCascade {
    cascade: CandidateCascade,
    retry: RateLimitRetry,
}

impl ResilientCascade {
    /// Combine a cascade with a retry policy.
    pub fn new(cascade: CandidateCascade, retry: RateLimitRetry) -> Self {
        Self { cascade, retry }
    }

    /// The wrapped cascade.
    pub fn cascade(&self) -> &CandidateCascade {
        &self.cascade
    }

    /// Invoke the whole cascade, retrying it once on throttling.
    pub async fn generate(&self, request: &GenerateRequest) -> ProviderResult<GenerateResponse> {
        self.retry.run(|| self.cascade.invoke(request)).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
