//! Quorum configuration types and defaults.

use super::errors::QuorumError;
use crate::types::{Command, CommandKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;

/// Lowest threshold accepted; the configured value must be strictly above it.
pub const MINIMUM_QUORUM_THRESHOLD: f64 = 0.5;

/// Preset agreement thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuorumLevel {
    /// 95% of responding nodes must agree.
    High,
    /// 75% of responding nodes must agree.
    Medium,
    /// 60% of responding nodes must agree.
    Low,
}

impl QuorumLevel {
    #[must_use]
    pub const fn threshold(self) -> f64 {
        match self {
            Self::High => 0.95,
            Self::Medium => 0.75,
            Self::Low => 0.60,
        }
    }
}

/// Configuration of a [`QuorumExecutor`](super::QuorumExecutor).
///
/// Immutable once the executor is built; [`validate`](Self::validate) runs at
/// construction time so invalid settings never reach a call.
///
/// ```toml
/// [quorum]
/// nodes = ["https://node-a:14265", "https://node-b:14265", "https://node-c:14265"]
/// threshold = 0.75
/// no_response_tolerance = 0.25
/// max_freshness_delta = 1
/// forced_quorum_kinds = ["broadcastTransactions"]
///
/// [quorum.defaults]
/// were_addresses_spent_from = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// Distinct node endpoints queried for every voted command. At least two.
    #[serde(default)]
    pub nodes: Vec<String>,

    /// Node answering exempt commands. It does not take part in votes unless it
    /// is also listed in `nodes`. When absent, a node from `nodes` is selected.
    #[serde(default)]
    pub primary_node: Option<String>,

    /// Fraction of responding nodes that must agree, in (0.5, 1]. `1.0`
    /// requires unanimity. Defaults to [`QuorumLevel::High`].
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Fraction of nodes, in [0, 1], allowed to fail before the call is
    /// aborted. Defaults to `0.0`.
    #[serde(default)]
    pub no_response_tolerance: f64,

    /// Maximum distance between highest and lowest observed milestone index
    /// for the freshness vote. Defaults to `1`.
    #[serde(default = "default_max_freshness_delta")]
    pub max_freshness_delta: u64,

    /// Exempt command kinds that should still be voted on.
    #[serde(default)]
    pub forced_quorum_kinds: HashSet<CommandKind>,

    /// Values returned when no quorum is reached.
    #[serde(default)]
    pub defaults: QuorumDefaults,

    /// Per-node timeout in seconds. A node exceeding it counts as failed.
    /// When absent only the transport's own timeout applies.
    #[serde(default)]
    pub node_timeout_seconds: Option<u64>,
}

fn default_threshold() -> f64 {
    QuorumLevel::High.threshold()
}

fn default_max_freshness_delta() -> u64 {
    1
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            primary_node: None,
            threshold: default_threshold(),
            no_response_tolerance: 0.0,
            max_freshness_delta: default_max_freshness_delta(),
            forced_quorum_kinds: HashSet::new(),
            defaults: QuorumDefaults::default(),
            node_timeout_seconds: None,
        }
    }
}

impl QuorumConfig {
    /// Creates a configuration for `nodes` with default settings.
    #[must_use]
    pub fn new<S: Into<String>>(nodes: impl IntoIterator<Item = S>) -> Self {
        Self { nodes: nodes.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    /// Checks every invariant of the configuration.
    ///
    /// # Errors
    ///
    /// - [`QuorumError::NotEnoughNodes`] with fewer than two nodes
    /// - [`QuorumError::InvalidNodeUrl`] if a node or the primary is not an absolute URL
    /// - [`QuorumError::DuplicateNode`] if a node is listed twice
    /// - [`QuorumError::InvalidThreshold`] unless `0.5 < threshold <= 1`
    /// - [`QuorumError::InvalidNoResponseTolerance`] unless `0 <= tolerance <= 1`
    /// - [`QuorumError::InvalidNodeTimeout`] if `node_timeout_seconds` is zero
    pub fn validate(&self) -> Result<(), QuorumError> {
        if self.nodes.len() < 2 {
            return Err(QuorumError::NotEnoughNodes(self.nodes.len()));
        }

        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            url::Url::parse(node).map_err(|_| QuorumError::InvalidNodeUrl(node.clone()))?;
            if !seen.insert(node.as_str()) {
                return Err(QuorumError::DuplicateNode(node.clone()));
            }
        }
        if let Some(primary) = &self.primary_node {
            url::Url::parse(primary).map_err(|_| QuorumError::InvalidNodeUrl(primary.clone()))?;
        }

        if !(self.threshold > MINIMUM_QUORUM_THRESHOLD && self.threshold <= 1.0) {
            return Err(QuorumError::InvalidThreshold(self.threshold));
        }

        if !(0.0..=1.0).contains(&self.no_response_tolerance) {
            return Err(QuorumError::InvalidNoResponseTolerance(self.no_response_tolerance));
        }

        if self.node_timeout_seconds == Some(0) {
            return Err(QuorumError::InvalidNodeTimeout(0));
        }

        Ok(())
    }

    /// Returns `true` if an exempt `kind` has been forced into the vote.
    #[must_use]
    pub fn is_forced(&self, kind: &CommandKind) -> bool {
        self.forced_quorum_kinds.contains(kind)
    }
}

/// Fallback answers used only when no quorum is reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumDefaults {
    /// Spent state reported for every queried address.
    #[serde(default)]
    pub were_addresses_spent_from: Option<bool>,

    /// Inclusion state reported for every queried transaction.
    #[serde(default)]
    pub get_inclusion_states: Option<bool>,

    /// Balance reported for every queried address.
    #[serde(default)]
    pub get_balances: Option<u64>,
}

impl QuorumDefaults {
    /// Builds the default response for `command`, shaped like a node's answer,
    /// or `None` if no default is configured for its kind.
    #[must_use]
    pub fn response_for(&self, command: &Command) -> Option<Value> {
        match command.kind() {
            CommandKind::WereAddressesSpentFrom => self
                .were_addresses_spent_from
                .map(|state| json!({ "states": vec![state; command.param_len("addresses")] })),
            CommandKind::GetInclusionStates => self
                .get_inclusion_states
                .map(|state| json!({ "states": vec![state; command.param_len("transactions")] })),
            CommandKind::GetBalances => self.get_balances.map(|balance| {
                json!({ "balances": vec![balance.to_string(); command.param_len("addresses")] })
            }),
            _ => None,
        }
    }

    /// Returns `true` when no default is configured for any kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.were_addresses_spent_from.is_none() &&
            self.get_inclusion_states.is_none() &&
            self.get_balances.is_none()
    }
}
