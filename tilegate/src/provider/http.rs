//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use super::types::ProviderError;

/// User agent identifying the proxy to the upstream provider.
pub const USER_AGENT: &str = concat!("tilegate/", env!("CARGO_PKG_VERSION"), " (tile cache)");

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests. The returned error separates
/// transport failures from non-success statuses, because the two classes
/// are cached differently.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Transport`] for connection, DNS, deadline or
    ///   body-read failures
    /// - [`ProviderError::Status`] when the upstream answers with a
    ///   non-success status
    fn get(&self, url: &str) -> impl Future<Output = Result<Bytes, ProviderError>> + Send;
}

/// Real HTTP client implementation using reqwest.
///
/// Every request carries the fixed identifying user agent and a bounded
/// deadline; an upstream that hangs surfaces as a transport error.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the given per-request deadline.
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Client(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Bytes, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(format!("failed to read response: {e}")))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Mock HTTP client for testing
    pub struct MockHttpClient {
        pub response: Result<Bytes, ProviderError>,
    }

    impl HttpClient for MockHttpClient {
        async fn get(&self, _url: &str) -> Result<Bytes, ProviderError> {
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockHttpClient {
            response: Ok(Bytes::from_static(&[1, 2, 3, 4])),
        };

        let result = mock.get("http://example.com").await;
        assert_eq!(result.unwrap(), Bytes::from_static(&[1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn test_mock_client_status_error() {
        let mock = MockHttpClient {
            response: Err(ProviderError::Status(500)),
        };

        let result = mock.get("http://example.com").await;
        assert!(matches!(result, Err(ProviderError::Status(500))));
    }

    #[test]
    fn test_user_agent_identifies_tilegate() {
        assert!(USER_AGENT.starts_with("tilegate/"));
    }
}
