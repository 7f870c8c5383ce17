//! Provider error types.

use thiserror::Error;

/// Errors from the upstream tile provider.
///
/// The split between [`ProviderError::Transport`] and
/// [`ProviderError::Status`] is load-bearing: transport failures are
/// negative-cached by the service, status failures are not.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network-level failure: connection refused, DNS, deadline exceeded,
    /// or a failure while reading the response body.
    #[error("transport error reaching upstream: {0}")]
    Transport(String),

    /// The upstream answered with a non-success HTTP status.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// The HTTP client could not be constructed (startup-time only).
    #[error("{0}")]
    Client(String),
}
