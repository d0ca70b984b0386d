//! # podhunter-transcription
//!
//! Turns audio into text on one of two mutually exclusive backends.
//!
//! - [`Dispatcher`]: picks the backend for a job from the caller's
//!   preference and the probed [`HostCapability`], then runs it
//! - [`RemoteTranscriber`]: inline audio sent through the model cascade
//! - [`LocalBridge`]: external engine run as a subprocess over a temporary
//!   audio file

#![deny(unsafe_code)]

pub mod capability;
pub mod dispatcher;
pub mod errors;
pub mod local;
pub mod remote;

pub use capability::{Backend, BridgePaths, HostCapability, select_backend};
pub use dispatcher::{
    Dispatcher, EMPTY_TRANSCRIPT, Transcriber, TranscriptionJob, TranscriptionResult,
};
pub use errors::TranscriptionError;
pub use local::LocalBridge;
pub use remote::RemoteTranscriber;
