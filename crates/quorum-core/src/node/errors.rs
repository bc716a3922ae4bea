use thiserror::Error;

/// Errors produced while calling a single node.
///
/// A node error never reaches the caller of a quorum command on its own: it
/// counts toward the no-response tolerance, and one sample is attached when
/// that tolerance is exceeded. Only the direct (non-quorum) path relays it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NodeError {
    /// The node did not answer within the configured timeout.
    #[error("request timeout")]
    Timeout,

    /// The node could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Network-level failure reported by the HTTP client.
    #[error("network error: {0}")]
    Network(String),

    /// The freshness query requires a 200 answer from every node.
    #[error("non ok status code {0} for subtangle milestone query")]
    NonOkStatus(u16),

    /// The response body could not be read.
    #[error("response body error: {0}")]
    Body(String),
}

impl NodeError {
    /// Returns a static label for metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::Network(_) => "network",
            Self::NonOkStatus(_) => "non_ok_status",
            Self::Body(_) => "body",
        }
    }
}
