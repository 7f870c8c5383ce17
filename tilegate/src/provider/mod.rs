//! Upstream tile provider abstraction
//!
//! This module provides the HTTP client capability trait, the reqwest-backed
//! implementation with its fixed deadline and user agent, and the LINZ
//! provider that builds the metered upstream URLs.

mod http;
mod linz;
mod types;

pub use http::{HttpClient, ReqwestClient, USER_AGENT};
pub use linz::LinzProvider;
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::MockHttpClient;
