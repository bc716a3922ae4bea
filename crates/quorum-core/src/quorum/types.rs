use super::errors::QuorumError;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Instant;

/// How a command was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One node answered on its own.
    NonQuorumDirect,
    /// All nodes voted on the canonical response.
    MajorityVote,
    /// All nodes reported their milestone; the lowest within the delta bound won.
    FreshnessVote,
}

impl Strategy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonQuorumDirect => "non_quorum_direct",
            Self::MajorityVote => "majority_vote",
            Self::FreshnessVote => "freshness_vote",
        }
    }
}

/// Where the returned body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Body of the winning vote group.
    Agreement,
    /// Synthesized from `QuorumDefaults` after the threshold was missed.
    ConfiguredDefault,
    /// The lowest milestone of the freshness vote.
    LowestMilestone,
    /// Relayed from the single node of a direct call.
    SingleNode,
}

/// Details of a successful execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuorumMetadata {
    pub strategy: Strategy,
    pub source: ResultSource,
    /// Fraction of responding nodes in the winning group (majority vote only).
    pub agreement: Option<f64>,
    /// Size of the winning group.
    pub votes: usize,
    /// Nodes that produced a usable reply.
    pub responded: usize,
    /// Nodes the command was sent to.
    pub total_nodes: usize,
    /// Endpoint that served a direct call.
    pub served_by: Option<String>,
    pub duration_ms: u64,
}

impl QuorumMetadata {
    pub(crate) fn new(strategy: Strategy, source: ResultSource, total_nodes: usize) -> Self {
        Self {
            strategy,
            source,
            agreement: None,
            votes: 0,
            responded: 0,
            total_nodes,
            served_by: None,
            duration_ms: 0,
        }
    }
}

/// The single trusted answer of a quorum call, as JSON bytes.
#[derive(Debug, Clone)]
pub struct QuorumResult {
    pub body: Bytes,
    pub metadata: QuorumMetadata,
}

impl QuorumResult {
    /// Decodes the body into the caller's response type.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Decode`] if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, QuorumError> {
        serde_json::from_slice(&self.body).map_err(QuorumError::Decode)
    }

    pub(crate) fn finish(mut self, start: Instant) -> Self {
        self.metadata.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self
    }
}
