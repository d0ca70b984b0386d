//! # podhunter-fetch
//!
//! Endpoint-fallback content retrieval.
//!
//! - [`Fetcher`]: direct attempt (downloads only) followed by the ordered
//!   [`ProxyChain`]; fails with [`FetchError::RetrievalExhausted`] only once
//!   every path has failed
//! - [`HttpClient`]: async HTTP seam, [`ReqwestHttpClient`] in production
//! - [`ProxyTransform`]: pure target-URL rewrite for one relay

#![deny(unsafe_code)]

pub mod errors;
pub mod fetcher;
pub mod http;
pub mod proxy;

pub use errors::FetchError;
pub use fetcher::{Fetcher, Payload, RetrievalRequest};
pub use http::{HttpClient, HttpResponse, ReqwestHttpClient};
pub use proxy::{ProxyChain, ProxyTransform};
