//! # podhunter-llm
//!
//! Remote inference for the pipeline.
//!
//! - [`provider`]: the [`ModelBackend`] seam, request/response types and
//!   [`ProviderError`]
//! - [`gemini`]: Gemini `generateContent` client
//! - [`cascade`]: ordered model fallback ([`CandidateCascade`])
//! - [`retry`]: single cooldown-and-retry on throttling ([`RateLimitRetry`]),
//!   and [`ResilientCascade`] combining the two
//! - [`error_parsing`]: API error envelope parsing

#![deny(unsafe_code)]

pub mod cascade;
pub mod error_parsing;
pub mod gemini;
pub mod provider;
pub mod retry;

pub use cascade::CandidateCascade;
pub use gemini::GeminiClient;
pub use provider::{
    GenerateRequest, GenerateResponse, ModelBackend, ProviderError, ProviderResult, RequestPart,
};
pub use retry::{RateLimitRetry, ResilientCascade, Sleeper, TokioSleeper};
