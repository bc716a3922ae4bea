//! Majority vote over HTTP.

use crate::mock_infrastructure::{executor_for, executor_with, start_nodes, UNREACHABLE_NODE};
use quorum_core::{
    node::NodeError,
    quorum::{QuorumDefaults, ResultSource},
    types::GetBalancesResponse,
    Command, CommandKind, QuorumConfig, QuorumError,
};
use serde_json::{json, Value};

#[tokio::test]
async fn test_balances_agree_despite_volatile_fields() {
    let mut nodes = start_nodes(3).await;
    for (i, node) in nodes.iter_mut().enumerate() {
        node.mock_command_expect(
            "getBalances",
            &json!({
                "balances": ["1000", "0"],
                "references": ["REF"],
                "milestoneIndex": 100 + i,
                "duration": 10 * i
            }),
            1,
        );
    }
    let executor = executor_for(&nodes, QuorumConfig { threshold: 1.0, ..QuorumConfig::default() });

    let result = executor
        .execute_detailed(&Command::get_balances(["ADDR1", "ADDR2"], 100))
        .await
        .unwrap();
    assert_eq!(result.metadata.agreement, Some(1.0));
    assert_eq!(result.metadata.votes, 3);

    let balances: GetBalancesResponse = result.decode().unwrap();
    assert_eq!(balances.balances, vec!["1000".to_string(), "0".to_string()]);
    assert_eq!(balances.references, vec!["REF".to_string()]);

    for node in &nodes {
        node.assert_all();
    }
}

#[tokio::test]
async fn test_minority_answer_is_outvoted() {
    let mut nodes = start_nodes(4).await;
    for (i, node) in nodes.iter_mut().enumerate() {
        let spent = i == 2;
        node.mock_command("wereAddressesSpentFrom", 200, &json!({"states": [spent], "duration": 1}));
    }
    let executor = executor_for(&nodes, QuorumConfig { threshold: 0.75, ..QuorumConfig::default() });

    let states = executor.were_addresses_spent_from(["ADDR"]).await.unwrap();
    assert_eq!(states, vec![false]);
}

#[tokio::test]
async fn test_split_vote_without_default_fails() {
    let mut nodes = start_nodes(2).await;
    nodes[0].mock_command("getInclusionStates", 200, &json!({"states": [true]}));
    nodes[1].mock_command("getInclusionStates", 200, &json!({"states": [false]}));
    let executor = executor_for(&nodes, QuorumConfig::default());

    let err = executor.get_inclusion_states(["TX"], ["TIP"]).await.unwrap_err();
    assert!(matches!(
        err,
        QuorumError::QuorumNotReached { kind: CommandKind::GetInclusionStates, .. }
    ));
}

#[tokio::test]
async fn test_split_vote_with_default() {
    let mut nodes = start_nodes(2).await;
    nodes[0].mock_command("getBalances", 200, &json!({"balances": ["5", "5"]}));
    nodes[1].mock_command("getBalances", 200, &json!({"balances": ["5", "6"]}));
    let config = QuorumConfig {
        defaults: QuorumDefaults { get_balances: Some(0), ..QuorumDefaults::default() },
        ..QuorumConfig::default()
    };
    let executor = executor_for(&nodes, config);

    let result = executor.execute_detailed(&Command::get_balances(["A", "B"], 100)).await.unwrap();
    assert_eq!(result.metadata.source, ResultSource::ConfiguredDefault);
    let balances: GetBalancesResponse = result.decode().unwrap();
    assert_eq!(balances.balances, vec!["0".to_string(), "0".to_string()]);
}

#[tokio::test]
async fn test_unknown_command_error_is_agreed() {
    let mut nodes = start_nodes(3).await;
    for node in &mut nodes {
        node.mock_error("getBanana", 400, "Command [getBanana] is unknown");
    }
    let executor = executor_for(&nodes, QuorumConfig::default());

    let err = executor
        .execute::<Value>(&Command::new(CommandKind::from("getBanana")))
        .await
        .unwrap_err();
    match err {
        QuorumError::RequestError(request_error) => {
            assert_eq!(request_error.code, 400);
            assert_eq!(request_error.error, "Command [getBanana] is unknown");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_node_within_tolerance() {
    let mut nodes = start_nodes(3).await;
    for node in &mut nodes {
        node.mock_command("checkConsistency", 200, &json!({"state": true, "info": ""}));
    }
    let config =
        QuorumConfig { threshold: 1.0, no_response_tolerance: 0.25, ..QuorumConfig::default() };
    let executor = executor_with(&nodes, &[UNREACHABLE_NODE], config);

    let result = executor.execute_detailed(&Command::check_consistency(["TAIL"])).await.unwrap();
    assert_eq!(result.metadata.responded, 3);
    assert_eq!(result.metadata.total_nodes, 4);

    let consistency: quorum_core::types::CheckConsistencyResponse = result.decode().unwrap();
    assert!(consistency.state);
}

#[tokio::test]
async fn test_unreachable_node_beyond_tolerance() {
    let mut nodes = start_nodes(2).await;
    for node in &mut nodes {
        node.mock_command("getTrytes", 200, &json!({"trytes": ["999"]}));
    }
    let executor = executor_with(&nodes, &[UNREACHABLE_NODE], QuorumConfig::default());

    let err = executor
        .execute::<Value>(&Command::get_trytes(["HASH"]))
        .await
        .unwrap_err();
    match err {
        QuorumError::ExceededNoResponseTolerance { failed_percent, first_error } => {
            assert_eq!(failed_percent, 33);
            assert!(matches!(
                first_error,
                NodeError::ConnectionFailed(_) | NodeError::Network(_)
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_consistency_info_does_not_split_the_vote() {
    let mut nodes = start_nodes(3).await;
    for (i, node) in nodes.iter_mut().enumerate() {
        node.mock_command(
            "checkConsistency",
            200,
            &json!({"state": false, "info": format!("tails are not consistent (seen by node {i})")}),
        );
    }
    let executor = executor_for(&nodes, QuorumConfig { threshold: 1.0, ..QuorumConfig::default() });

    let consistency = executor.check_consistency(["TAIL"]).await.unwrap();
    assert!(!consistency.state);
}
