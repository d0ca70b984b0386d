//! # podhunter-core
//!
//! Foundation shared by every podhunter crate:
//!
//! - **Errors**: message classification ([`errors::classify_message`]) and the
//!   [`errors::UserFacing`] trait that gives every surfaced error an actionable hint
//! - **Text**: UTF-8 safe truncation used before handing page source to a model
//! - **Logging**: `tracing` subscriber setup for binaries

#![deny(unsafe_code)]

pub mod errors;
pub mod logging;
pub mod text;

pub use errors::{ErrorCategory, UserFacing, classify_message, is_rate_limit_message};
