//! # Quorum Metrics
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! application installs a recorder (the CLI installs a Prometheus one).
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `quorum_executions_total` | counter | `kind`, `strategy`, `outcome` |
//! | `quorum_node_failures_total` | counter | `node`, `error` |
//! | `quorum_agreement_ratio` | histogram | `kind` |
//! | `quorum_defaults_used_total` | counter | `kind` |
//! | `quorum_milestone_delta` | histogram | |
//! | `quorum_execution_duration_seconds` | histogram | `strategy` |
//!
//! Node endpoints appear as label values. They come from configuration, so
//! cardinality is bounded by the node list.

use crate::{
    node::NodeError,
    quorum::{QuorumError, Strategy},
    types::CommandKind,
};
use metrics::{counter, histogram};
use std::time::Duration;

/// Static label for a command kind. Custom kinds share one label so arbitrary
/// command names cannot grow the label set.
#[must_use]
pub fn kind_label(kind: &CommandKind) -> &'static str {
    match kind {
        CommandKind::GetNodeInfo => "getNodeInfo",
        CommandKind::GetNeighbors => "getNeighbors",
        CommandKind::AddNeighbors => "addNeighbors",
        CommandKind::RemoveNeighbors => "removeNeighbors",
        CommandKind::GetTips => "getTips",
        CommandKind::FindTransactions => "findTransactions",
        CommandKind::GetTrytes => "getTrytes",
        CommandKind::GetInclusionStates => "getInclusionStates",
        CommandKind::GetBalances => "getBalances",
        CommandKind::GetTransactionsToApprove => "getTransactionsToApprove",
        CommandKind::AttachToTangle => "attachToTangle",
        CommandKind::InterruptAttachToTangle => "interruptAttachToTangle",
        CommandKind::BroadcastTransactions => "broadcastTransactions",
        CommandKind::StoreTransactions => "storeTransactions",
        CommandKind::CheckConsistency => "checkConsistency",
        CommandKind::WereAddressesSpentFrom => "wereAddressesSpentFrom",
        CommandKind::LatestSolidSubtangleMilestone => "getLatestSolidSubtangleMilestone",
        CommandKind::Custom(_) => "custom",
    }
}

/// Records the outcome of one quorum call.
pub fn record_execution(
    kind: &CommandKind,
    strategy: Strategy,
    outcome: Result<(), &QuorumError>,
    elapsed: Duration,
) {
    let outcome = match outcome {
        Ok(()) => "success",
        Err(e) => e.as_str(),
    };
    counter!(
        "quorum_executions_total",
        "kind" => kind_label(kind),
        "strategy" => strategy.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("quorum_execution_duration_seconds", "strategy" => strategy.as_str())
        .record(elapsed.as_secs_f64());
}

/// Records a node that produced no usable reply.
pub fn record_node_failure(node: &str, error: &NodeError) {
    counter!(
        "quorum_node_failures_total",
        "node" => node.to_string(),
        "error" => error.as_str()
    )
    .increment(1);
}

/// Records the agreement ratio of a majority vote.
pub fn record_agreement(kind: &CommandKind, agreement: f64) {
    histogram!("quorum_agreement_ratio", "kind" => kind_label(kind)).record(agreement);
}

/// Records a configured default standing in for a missed quorum.
pub fn record_default_used(kind: &CommandKind) {
    counter!("quorum_defaults_used_total", "kind" => kind_label(kind)).increment(1);
}

/// Records the milestone spread observed by a freshness vote.
#[allow(clippy::cast_precision_loss)]
pub fn record_milestone_delta(delta: u64) {
    histogram!("quorum_milestone_delta").record(delta as f64);
}
