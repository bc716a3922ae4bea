//! Single-node transport.
//!
//! The quorum layer only ever talks to nodes through [`NodeCaller`]: one POST of
//! an already serialized command to one node, returning the raw body and status.
//! Non-200 statuses are replies, not errors, so that nodes can agree on an error.
//!
//! - [`HttpNodeCaller`]: reqwest implementation sharing one connection pool and
//!   concurrency limit across all configured nodes
//! - [`NodeSelector`]: strategy picking the node for commands that are not voted on

pub mod errors;
pub mod http_client;
pub mod selector;

pub use errors::NodeError;
pub use http_client::{HttpClientConfig, HttpNodeCaller, SharedHttpClient};
pub use selector::{FixedSelector, NodeSelector, RandomSelector};

use async_trait::async_trait;
use bytes::Bytes;

/// HTTP status a node answers with on success.
pub const STATUS_OK: u16 = 200;

/// Raw answer of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReply {
    pub status: u16,
    pub body: Bytes,
}

impl NodeReply {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Performs one call of one command against one node.
#[async_trait]
pub trait NodeCaller: Send + Sync {
    /// Endpoint identifying this node in logs and errors.
    fn endpoint(&self) -> &str;

    /// Sends the serialized command body and returns the node's raw reply.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] when no reply could be obtained at all.
    async fn call(&self, body: Bytes) -> Result<NodeReply, NodeError>;
}
