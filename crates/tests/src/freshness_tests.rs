//! Milestone freshness vote over HTTP.

use crate::mock_infrastructure::{executor_for, hash_of, start_nodes};
use quorum_core::{node::NodeError, QuorumConfig, QuorumError};

#[tokio::test]
async fn test_lowest_milestone_within_delta() {
    let mut nodes = start_nodes(4).await;
    for (node, (hash, index)) in
        nodes.iter_mut().zip([('N', 2), ('M', 1), ('N', 2), ('M', 1)])
    {
        node.mock_node_info(&hash_of(hash), index);
    }
    let executor = executor_for(&nodes, QuorumConfig { max_freshness_delta: 1, ..QuorumConfig::default() });

    let milestone = executor.latest_solid_subtangle_milestone().await.unwrap();
    assert_eq!(milestone.index, 1);
    assert_eq!(milestone.hash, hash_of('M'));
}

#[tokio::test]
async fn test_delta_exceeded() {
    let mut nodes = start_nodes(3).await;
    for (node, index) in nodes.iter_mut().zip([500, 503, 501]) {
        node.mock_node_info(&hash_of('A'), index);
    }
    let urls: Vec<String> = nodes.iter().map(|node| node.url()).collect();
    let executor = executor_for(&nodes, QuorumConfig { max_freshness_delta: 2, ..QuorumConfig::default() });

    let err = executor.latest_solid_subtangle_milestone().await.unwrap_err();
    match err {
        QuorumError::ExceededMaxFreshnessDelta { lowest_node, lowest_index, highest_node, highest_index, .. } => {
            assert_eq!(lowest_node, urls[0]);
            assert_eq!(lowest_index, 500);
            assert_eq!(highest_node, urls[1]);
            assert_eq!(highest_index, 503);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unmocked_nodes_exceed_tolerance() {
    // No mocks: mockito answers every request with 501.
    let nodes = start_nodes(3).await;
    let executor = executor_for(&nodes, QuorumConfig::default());

    let err = executor.latest_solid_subtangle_milestone().await.unwrap_err();
    assert!(matches!(
        err,
        QuorumError::ExceededNoResponseTolerance {
            failed_percent: 100,
            first_error: NodeError::NonOkStatus(501)
        }
    ));
}

#[tokio::test]
async fn test_node_info_without_milestone() {
    let mut nodes = start_nodes(2).await;
    nodes[0].mock_node_info(&hash_of('M'), 10);
    nodes[1].mock_command("getNodeInfo", 200, &serde_json::json!({"appName": "IRI"}));
    let executor = executor_for(&nodes, QuorumConfig::default());

    let err = executor.latest_solid_subtangle_milestone().await.unwrap_err();
    assert!(matches!(err, QuorumError::NoLatestSubtangleInfo(_)));
}
