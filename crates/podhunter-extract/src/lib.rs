//! # podhunter-extract
//!
//! Locates the audio stream URL in a page source.
//!
//! [`ExtractionCascade`] asks a [`StructuredGenerator`] for a strictly
//! validated [`ExtractionVerdict`] and falls back to two regex strategies
//! when the model misses or fails.

#![deny(unsafe_code)]

pub mod cascade;
pub mod errors;
pub mod patterns;
pub mod verdict;

pub use cascade::{Extraction, ExtractionCascade, Strategy, StructuredGenerator};
pub use errors::ExtractError;
pub use verdict::{Confidence, ExtractionVerdict};
