use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::{NodeCaller, NodeError, NodeReply};

/// API version header every node expects.
pub const API_VERSION_HEADER: &str = "X-IOTA-API-Version";

/// Configuration for the HTTP transport shared by all nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Maximum number of concurrent HTTP requests across all nodes. Defaults to `256`.
    #[serde(default = "default_concurrent_limit")]
    pub concurrent_limit: usize,

    /// Permit acquisition timeout in milliseconds. Defaults to `500`.
    #[serde(default = "default_permit_timeout_ms")]
    pub permit_timeout_ms: u64,

    /// TCP connect timeout in seconds. Defaults to `5`.
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Whole-request timeout in seconds. Defaults to `45`.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Value sent in the API version header. Defaults to `"1"`.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_concurrent_limit() -> usize {
    256
}

fn default_permit_timeout_ms() -> u64 {
    500
}

fn default_connect_timeout_seconds() -> u64 {
    5
}

fn default_request_timeout_seconds() -> u64 {
    45
}

fn default_api_version() -> String {
    "1".to_string()
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            concurrent_limit: default_concurrent_limit(),
            permit_timeout_ms: default_permit_timeout_ms(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            api_version: default_api_version(),
        }
    }
}

/// reqwest client plus a semaphore bounding in-flight requests.
///
/// One instance is shared by every [`HttpNodeCaller`] of an executor so that
/// all nodes reuse the same connection pool.
pub struct SharedHttpClient {
    client: Client,
    concurrent_limit: Arc<Semaphore>,
    config: HttpClientConfig,
}

/// RAII guard ensuring semaphore permits are always released.
struct PermitGuard {
    _permit: OwnedSemaphorePermit,
    semaphore: Arc<Semaphore>,
}

impl Drop for PermitGuard {
    fn drop(&mut self) {
        tracing::trace!(available_permits = self.semaphore.available_permits(), "permit released");
    }
}

impl SharedHttpClient {
    /// Creates a shared client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, NodeError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Creates a shared client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: HttpClientConfig) -> Result<Self, NodeError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("quorum-core/", env!("CARGO_PKG_VERSION")))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                NodeError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self { client, concurrent_limit: Arc::new(Semaphore::new(config.concurrent_limit)), config })
    }

    #[must_use]
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Maps a reqwest error to a node error without leaking the node's response text.
    fn sanitize_network_error(error: &reqwest::Error) -> NodeError {
        if error.is_timeout() {
            NodeError::Timeout
        } else if error.is_connect() {
            NodeError::ConnectionFailed("connection refused or unreachable".to_string())
        } else if error.is_body() || error.is_decode() {
            NodeError::Body("response body error".to_string())
        } else if error.is_redirect() {
            NodeError::Network("unexpected redirect".to_string())
        } else if error.is_request() {
            NodeError::Network("request failed".to_string())
        } else {
            NodeError::Network("network error".to_string())
        }
    }

    /// POSTs `body` to `url` and returns status and body, whatever the status.
    ///
    /// # Errors
    ///
    /// - [`NodeError::Timeout`] if permit acquisition or the request times out
    /// - [`NodeError::ConnectionFailed`], [`NodeError::Network`], [`NodeError::Body`]
    ///   for transport failures
    pub async fn post(&self, url: &str, body: Bytes) -> Result<NodeReply, NodeError> {
        let permit = tokio::time::timeout(
            Duration::from_millis(self.config.permit_timeout_ms),
            Arc::clone(&self.concurrent_limit).acquire_owned(),
        )
        .await
        .map_err(|_| {
            tracing::warn!(
                url = url,
                available_permits = self.concurrent_limit.available_permits(),
                "http client semaphore acquisition timeout"
            );
            NodeError::Timeout
        })?
        .map_err(|_| NodeError::Network("http client closed".to_string()))?;

        let _guard = PermitGuard { _permit: permit, semaphore: Arc::clone(&self.concurrent_limit) };

        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .header(API_VERSION_HEADER, self.config.api_version.as_str())
            .body(body)
            .send()
            .await
            .map_err(|e| Self::sanitize_network_error(&e))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| Self::sanitize_network_error(&e))?;

        tracing::trace!(url = url, status = status, bytes = body.len(), "node replied");
        Ok(NodeReply { status, body })
    }

    #[cfg(test)]
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.concurrent_limit.available_permits()
    }
}

/// [`NodeCaller`] for one node reached over HTTP.
pub struct HttpNodeCaller {
    endpoint: String,
    client: Arc<SharedHttpClient>,
}

impl HttpNodeCaller {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, client: Arc<SharedHttpClient>) -> Self {
        Self { endpoint: endpoint.into(), client }
    }
}

#[async_trait]
impl NodeCaller for HttpNodeCaller {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, body: Bytes) -> Result<NodeReply, NodeError> {
        self.client.post(&self.endpoint, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_config_default() {
        let config = HttpClientConfig::default();
        assert_eq!(config.concurrent_limit, 256);
        assert_eq!(config.permit_timeout_ms, 500);
        assert_eq!(config.connect_timeout_seconds, 5);
        assert_eq!(config.request_timeout_seconds, 45);
        assert_eq!(config.api_version, "1");
    }

    #[test]
    fn test_shared_client_new() {
        let client = SharedHttpClient::new();
        assert!(client.is_ok(), "SharedHttpClient::new() should succeed");
        assert_eq!(client.unwrap().available_permits(), 256);
    }

    #[test]
    fn test_http_node_caller_endpoint() {
        let client = Arc::new(SharedHttpClient::new().unwrap());
        let caller = HttpNodeCaller::new("http://node-1:14265", client);
        assert_eq!(caller.endpoint(), "http://node-1:14265");
    }

    #[tokio::test]
    async fn test_unreachable_node_is_a_connection_error() {
        let config = HttpClientConfig { connect_timeout_seconds: 1, ..Default::default() };
        let client = Arc::new(SharedHttpClient::with_config(config).unwrap());
        // Port 9 (discard) on localhost is closed in test environments.
        let caller = HttpNodeCaller::new("http://127.0.0.1:9", Arc::clone(&client));

        let result = caller.call(Bytes::from_static(b"{}")).await;
        assert!(result.is_err());
        assert_eq!(client.available_permits(), 256, "permit must be released on error");
    }
}
