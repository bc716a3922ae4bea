//! Routing of exempt and forced command kinds over HTTP.

use crate::mock_infrastructure::{start_nodes, NodeMockBuilder};
use quorum_core::{
    node::FixedSelector,
    quorum::Strategy,
    Command, CommandKind, QuorumConfig, QuorumExecutor,
};
use serde_json::json;
use std::collections::HashSet;

#[tokio::test]
async fn test_exempt_command_goes_to_primary_only() {
    let mut nodes = start_nodes(3).await;
    for node in &mut nodes {
        node.mock_command_expect("getTips", &json!({"hashes": ["VOTER"]}), 0);
    }
    let mut primary = NodeMockBuilder::new().await;
    primary.mock_command_expect("getTips", &json!({"hashes": ["PRIMARY"]}), 1);

    let config = QuorumConfig {
        nodes: nodes.iter().map(NodeMockBuilder::url).collect(),
        primary_node: Some(primary.url()),
        ..QuorumConfig::default()
    };
    let executor = QuorumExecutor::new(config).unwrap();

    let result = executor.execute_detailed(&Command::get_tips()).await.unwrap();
    assert_eq!(result.metadata.strategy, Strategy::NonQuorumDirect);
    assert_eq!(result.metadata.served_by, Some(primary.url()));
    let tips: quorum_core::types::GetTipsResponse = result.decode().unwrap();
    assert_eq!(tips.hashes, vec!["PRIMARY".to_string()]);

    primary.assert_all();
    for node in &nodes {
        node.assert_all();
    }
}

#[tokio::test]
async fn test_exempt_command_without_primary_uses_selected_node() {
    let mut nodes = start_nodes(3).await;
    for (i, node) in nodes.iter_mut().enumerate() {
        let hits = usize::from(i == 2);
        node.mock_command_expect("getTransactionsToApprove", &json!({"trunkTransaction": "T", "branchTransaction": "B"}), hits);
    }
    let config =
        QuorumConfig { nodes: nodes.iter().map(NodeMockBuilder::url).collect(), ..QuorumConfig::default() };
    let executor = QuorumExecutor::new(config).unwrap().with_selector(FixedSelector(2));

    let value: serde_json::Value =
        executor.execute(&Command::get_transactions_to_approve(3)).await.unwrap();
    assert_eq!(value["trunkTransaction"], "T");

    for node in &nodes {
        node.assert_all();
    }
}

#[tokio::test]
async fn test_forced_kind_reaches_every_node() {
    let mut nodes = start_nodes(3).await;
    for node in &mut nodes {
        node.mock_command_expect("broadcastTransactions", &json!({"duration": 2}), 1);
    }
    let config = QuorumConfig {
        nodes: nodes.iter().map(NodeMockBuilder::url).collect(),
        forced_quorum_kinds: HashSet::from([CommandKind::BroadcastTransactions]),
        ..QuorumConfig::default()
    };
    let executor = QuorumExecutor::new(config).unwrap();

    let result = executor
        .execute_detailed(&Command::broadcast_transactions(["TRYTES"]))
        .await
        .unwrap();
    assert_eq!(result.metadata.strategy, Strategy::MajorityVote);
    assert_eq!(result.metadata.votes, 3);

    for node in &nodes {
        node.assert_all();
    }
}
