//! Test helpers shared by the integration tests.

use super::NodeMockBuilder;
use quorum_core::{QuorumConfig, QuorumExecutor};

/// Endpoint nothing listens on; calls fail with a connection error.
pub const UNREACHABLE_NODE: &str = "http://127.0.0.1:9";

/// An 81-character hash made of `c`.
#[must_use]
pub fn hash_of(c: char) -> String {
    std::iter::repeat(c).take(81).collect()
}

/// Starts `count` node mocks.
pub async fn start_nodes(count: usize) -> Vec<NodeMockBuilder> {
    let mut nodes = Vec::with_capacity(count);
    for _ in 0..count {
        nodes.push(NodeMockBuilder::new().await);
    }
    nodes
}

/// Builds an HTTP executor voting across `nodes` plus any `extra` endpoints.
///
/// # Panics
///
/// Panics if the resulting configuration is invalid.
#[must_use]
pub fn executor_with(
    nodes: &[NodeMockBuilder],
    extra: &[&str],
    mut config: QuorumConfig,
) -> QuorumExecutor {
    config.nodes = nodes
        .iter()
        .map(NodeMockBuilder::url)
        .chain(extra.iter().map(ToString::to_string))
        .collect();
    QuorumExecutor::new(config).expect("valid quorum configuration")
}

/// Builds an HTTP executor voting across `nodes`.
///
/// # Panics
///
/// Panics if the resulting configuration is invalid.
#[must_use]
pub fn executor_for(nodes: &[NodeMockBuilder], config: QuorumConfig) -> QuorumExecutor {
    executor_with(nodes, &[], config)
}
