use super::freshness::MilestoneScanError;
use crate::{node::NodeError, types::CommandKind, types::RequestError};
use thiserror::Error;

/// Errors surfaced by quorum configuration and execution.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum QuorumError {
    #[error("at least 2 nodes must be defined for quorum, got {0}")]
    NotEnoughNodes(usize),

    #[error("invalid quorum threshold {0}: must be above 0.5 and at most 1")]
    InvalidThreshold(f64),

    #[error("invalid no-response tolerance {0}: must be within [0, 1]")]
    InvalidNoResponseTolerance(f64),

    #[error("invalid node url '{0}'")]
    InvalidNodeUrl(String),

    #[error("node '{0}' is configured more than once")]
    DuplicateNode(String),

    #[error("invalid node timeout {0}s: must be greater than 0")]
    InvalidNodeTimeout(u64),

    /// More nodes failed than `no_response_tolerance` allows.
    #[error(
        "exceeded no-response tolerance for quorum: {failed_percent}% of nodes failed to give a response, first error '{first_error}'"
    )]
    ExceededNoResponseTolerance { failed_percent: u32, first_error: NodeError },

    /// The largest agreeing group stayed below the threshold and no default
    /// was configured for the command kind.
    #[error(
        "the quorum didn't reach a satisfactory result: {agreement:.2} of needed {threshold:.2} reached, query ({kind})"
    )]
    QuorumNotReached { agreement: f64, threshold: f64, kind: CommandKind },

    #[error(
        "exceeded max subtangle milestone delta between nodes: lowest node ({lowest_node}) has {lowest_index}, highest node ({highest_node}) has {highest_index}, max. allowed delta {max_delta}"
    )]
    ExceededMaxFreshnessDelta {
        lowest_node: String,
        lowest_index: u64,
        highest_node: String,
        highest_index: u64,
        max_delta: u64,
    },

    #[error("no latest solid subtangle info found: {0}")]
    NoLatestSubtangleInfo(#[from] MilestoneScanError),

    /// The agreed (or directly relayed) answer was an application error.
    #[error(transparent)]
    RequestError(#[from] RequestError),

    /// The single node of a direct call could not be reached.
    #[error("node {endpoint} failed: {source}")]
    Node {
        endpoint: String,
        #[source]
        source: NodeError,
    },

    /// The HTTP transport could not be built.
    #[error("failed to build node transport: {0}")]
    Transport(#[source] NodeError),

    #[error("failed to serialize command: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to decode result: {0}")]
    Decode(#[source] serde_json::Error),
}

impl QuorumError {
    /// Returns `true` for errors raised while validating the configuration.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NotEnoughNodes(_) |
                Self::InvalidThreshold(_) |
                Self::InvalidNoResponseTolerance(_) |
                Self::InvalidNodeUrl(_) |
                Self::DuplicateNode(_) |
                Self::InvalidNodeTimeout(_)
        )
    }

    /// Returns a static label for metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotEnoughNodes(_) => "not_enough_nodes",
            Self::InvalidThreshold(_) => "invalid_threshold",
            Self::InvalidNoResponseTolerance(_) => "invalid_no_response_tolerance",
            Self::InvalidNodeUrl(_) => "invalid_node_url",
            Self::DuplicateNode(_) => "duplicate_node",
            Self::InvalidNodeTimeout(_) => "invalid_node_timeout",
            Self::ExceededNoResponseTolerance { .. } => "exceeded_no_response_tolerance",
            Self::QuorumNotReached { .. } => "quorum_not_reached",
            Self::ExceededMaxFreshnessDelta { .. } => "exceeded_max_freshness_delta",
            Self::NoLatestSubtangleInfo(_) => "no_latest_subtangle_info",
            Self::RequestError(_) => "request_error",
            Self::Node { .. } => "node",
            Self::Transport(_) => "transport",
            Self::Serialization(_) => "serialization",
            Self::Decode(_) => "decode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_not_reached_message() {
        let err = QuorumError::QuorumNotReached {
            agreement: 0.5,
            threshold: 0.95,
            kind: CommandKind::WereAddressesSpentFrom,
        };
        assert_eq!(
            err.to_string(),
            "the quorum didn't reach a satisfactory result: 0.50 of needed 0.95 reached, query (wereAddressesSpentFrom)"
        );
    }

    #[test]
    fn test_tolerance_message_carries_first_error() {
        let err = QuorumError::ExceededNoResponseTolerance {
            failed_percent: 100,
            first_error: NodeError::Timeout,
        };
        let message = err.to_string();
        assert!(message.contains("100% of nodes failed"));
        assert!(message.contains("'request timeout'"));
    }

    #[test]
    fn test_request_error_is_transparent() {
        let err: QuorumError = RequestError::from_body(400, br#"{"error":"bad"}"#).into();
        assert_eq!(err.to_string(), "error message: bad;http status code: 400;");
        assert_eq!(err.as_str(), "request_error");
    }

    #[test]
    fn test_configuration_errors() {
        assert!(QuorumError::NotEnoughNodes(1).is_configuration_error());
        assert!(QuorumError::InvalidNodeTimeout(0).is_configuration_error());
        assert!(!QuorumError::NoLatestSubtangleInfo(MilestoneScanError::NoObservations)
            .is_configuration_error());
    }
}
