//! Command and response types understood by the quorum layer.
//!
//! # Type Categories
//!
//! ## Requests
//! - [`CommandKind`]: Names every node command and drives routing, canonicalization
//!   and default lookup
//! - [`Command`]: The serializable request value (kind plus JSON parameters)
//!
//! ## Responses
//! - Response shapes for the commands that receive special treatment during voting
//!   (balances, inclusion states, spent addresses, consistency, transaction search)
//! - [`LatestSolidSubtangleMilestone`]: Result of the freshness vote
//! - [`RequestError`]: Application-level failure body returned by a node

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Every command a node understands, plus the virtual freshness query.
///
/// Kinds are written in configuration files by their API name
/// (e.g. `"broadcastTransactions"`); unknown names become [`CommandKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandKind {
    GetNodeInfo,
    GetNeighbors,
    AddNeighbors,
    RemoveNeighbors,
    GetTips,
    FindTransactions,
    GetTrytes,
    GetInclusionStates,
    GetBalances,
    GetTransactionsToApprove,
    AttachToTangle,
    InterruptAttachToTangle,
    BroadcastTransactions,
    StoreTransactions,
    CheckConsistency,
    WereAddressesSpentFrom,
    /// Node info reduced to the latest solid subtangle milestone. Sent on the
    /// wire as `getNodeInfo` but aggregated with the freshness vote.
    LatestSolidSubtangleMilestone,
    /// A command outside the known set. A `Custom` carrying a known name is
    /// resolved to its dedicated kind when a [`Command`] is built.
    Custom(String),
}

impl CommandKind {
    /// Returns the name used for this kind in configuration and logs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::GetNodeInfo => "getNodeInfo",
            Self::GetNeighbors => "getNeighbors",
            Self::AddNeighbors => "addNeighbors",
            Self::RemoveNeighbors => "removeNeighbors",
            Self::GetTips => "getTips",
            Self::FindTransactions => "findTransactions",
            Self::GetTrytes => "getTrytes",
            Self::GetInclusionStates => "getInclusionStates",
            Self::GetBalances => "getBalances",
            Self::GetTransactionsToApprove => "getTransactionsToApprove",
            Self::AttachToTangle => "attachToTangle",
            Self::InterruptAttachToTangle => "interruptAttachToTangle",
            Self::BroadcastTransactions => "broadcastTransactions",
            Self::StoreTransactions => "storeTransactions",
            Self::CheckConsistency => "checkConsistency",
            Self::WereAddressesSpentFrom => "wereAddressesSpentFrom",
            Self::LatestSolidSubtangleMilestone => "getLatestSolidSubtangleMilestone",
            Self::Custom(name) => name,
        }
    }

    /// Resolves a [`CommandKind::Custom`] holding a known name to its dedicated kind.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Custom(name) => Self::from(name.as_str()),
            known => known,
        }
    }

    /// Returns the value of the `command` field sent to a node.
    #[must_use]
    pub fn wire_name(&self) -> &str {
        match self {
            Self::LatestSolidSubtangleMilestone => "getNodeInfo",
            other => other.as_str(),
        }
    }

    /// Returns `true` for commands where voting is meaningless: node-local
    /// state, tip selection, proof-of-work and fire-and-forget submissions.
    #[must_use]
    pub fn is_quorum_exempt(&self) -> bool {
        matches!(
            self,
            Self::GetNodeInfo |
                Self::GetNeighbors |
                Self::AddNeighbors |
                Self::RemoveNeighbors |
                Self::GetTips |
                Self::GetTransactionsToApprove |
                Self::AttachToTangle |
                Self::InterruptAttachToTangle |
                Self::BroadcastTransactions |
                Self::StoreTransactions
        )
    }
}

impl From<&str> for CommandKind {
    fn from(name: &str) -> Self {
        match name {
            "getNodeInfo" => Self::GetNodeInfo,
            "getNeighbors" => Self::GetNeighbors,
            "addNeighbors" => Self::AddNeighbors,
            "removeNeighbors" => Self::RemoveNeighbors,
            "getTips" => Self::GetTips,
            "findTransactions" => Self::FindTransactions,
            "getTrytes" => Self::GetTrytes,
            "getInclusionStates" => Self::GetInclusionStates,
            "getBalances" => Self::GetBalances,
            "getTransactionsToApprove" => Self::GetTransactionsToApprove,
            "attachToTangle" => Self::AttachToTangle,
            "interruptAttachToTangle" => Self::InterruptAttachToTangle,
            "broadcastTransactions" => Self::BroadcastTransactions,
            "storeTransactions" => Self::StoreTransactions,
            "checkConsistency" => Self::CheckConsistency,
            "wereAddressesSpentFrom" => Self::WereAddressesSpentFrom,
            "getLatestSolidSubtangleMilestone" => Self::LatestSolidSubtangleMilestone,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for CommandKind {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<CommandKind> for String {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command to be executed against the node network.
///
/// Parameters are kept as a JSON object; the `command` field is added when the
/// body is serialized so it always matches [`CommandKind::wire_name`].
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    kind: CommandKind,
    params: Map<String, Value>,
}

impl Command {
    /// Creates a command without parameters.
    #[must_use]
    pub fn new(kind: CommandKind) -> Self {
        Self { kind: kind.normalized(), params: Map::new() }
    }

    /// Creates a command from any serializable parameter struct.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` does not serialize to a JSON object (or null).
    pub fn with_params<P: Serialize>(kind: CommandKind, params: &P) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(params)? {
            Value::Object(params) => Ok(Self { kind: kind.normalized(), params }),
            Value::Null => Ok(Self::new(kind)),
            _ => Err(<serde_json::Error as serde::ser::Error>::custom(
                "command parameters must serialize to a JSON object",
            )),
        }
    }

    /// Adds or replaces a single parameter.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    #[must_use]
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Length of an array parameter, or `0` if it is missing or not an array.
    #[must_use]
    pub fn param_len(&self, key: &str) -> usize {
        self.params.get(key).and_then(Value::as_array).map_or(0, Vec::len)
    }

    /// Serializes the request body sent to every node.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter value cannot be serialized.
    pub fn to_body(&self) -> Result<Bytes, serde_json::Error> {
        let mut body = Map::with_capacity(self.params.len() + 1);
        body.insert("command".to_string(), Value::String(self.kind.wire_name().to_string()));
        for (key, value) in &self.params {
            if key != "command" {
                body.insert(key.clone(), value.clone());
            }
        }
        serde_json::to_vec(&Value::Object(body)).map(Bytes::from)
    }

    #[must_use]
    pub fn get_node_info() -> Self {
        Self::new(CommandKind::GetNodeInfo)
    }

    /// Node info reduced to the latest solid subtangle milestone, answered by
    /// the freshness vote instead of a majority vote.
    #[must_use]
    pub fn latest_solid_subtangle_milestone() -> Self {
        Self::new(CommandKind::LatestSolidSubtangleMilestone)
    }

    #[must_use]
    pub fn get_tips() -> Self {
        Self::new(CommandKind::GetTips)
    }

    #[must_use]
    pub fn get_balances<S: Into<String>>(addresses: impl IntoIterator<Item = S>, threshold: u64) -> Self {
        Self::new(CommandKind::GetBalances)
            .param("addresses", string_array(addresses))
            .param("threshold", threshold)
    }

    #[must_use]
    pub fn were_addresses_spent_from<S: Into<String>>(addresses: impl IntoIterator<Item = S>) -> Self {
        Self::new(CommandKind::WereAddressesSpentFrom).param("addresses", string_array(addresses))
    }

    #[must_use]
    pub fn get_inclusion_states<S: Into<String>, T: Into<String>>(
        transactions: impl IntoIterator<Item = S>,
        tips: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::new(CommandKind::GetInclusionStates)
            .param("transactions", string_array(transactions))
            .param("tips", string_array(tips))
    }

    /// Searches transactions by any combination of the query fields; empty
    /// fields are omitted from the request.
    #[must_use]
    pub fn find_transactions(query: &FindTransactionsQuery) -> Self {
        let mut command = Self::new(CommandKind::FindTransactions);
        for (key, values) in [
            ("addresses", &query.addresses),
            ("bundles", &query.bundles),
            ("tags", &query.tags),
            ("approvees", &query.approvees),
        ] {
            if !values.is_empty() {
                command = command.param(key, string_array(values.iter().cloned()));
            }
        }
        command
    }

    #[must_use]
    pub fn get_trytes<S: Into<String>>(hashes: impl IntoIterator<Item = S>) -> Self {
        Self::new(CommandKind::GetTrytes).param("hashes", string_array(hashes))
    }

    #[must_use]
    pub fn check_consistency<S: Into<String>>(tails: impl IntoIterator<Item = S>) -> Self {
        Self::new(CommandKind::CheckConsistency).param("tails", string_array(tails))
    }

    #[must_use]
    pub fn get_transactions_to_approve(depth: u64) -> Self {
        Self::new(CommandKind::GetTransactionsToApprove).param("depth", depth)
    }

    #[must_use]
    pub fn broadcast_transactions<S: Into<String>>(trytes: impl IntoIterator<Item = S>) -> Self {
        Self::new(CommandKind::BroadcastTransactions).param("trytes", string_array(trytes))
    }

    #[must_use]
    pub fn store_transactions<S: Into<String>>(trytes: impl IntoIterator<Item = S>) -> Self {
        Self::new(CommandKind::StoreTransactions).param("trytes", string_array(trytes))
    }
}

fn string_array<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Value {
    Value::Array(values.into_iter().map(|v| Value::String(v.into())).collect())
}

/// Query fields for [`Command::find_transactions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindTransactionsQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approvees: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBalancesResponse {
    pub balances: Vec<String>,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub milestone_index: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetInclusionStatesResponse {
    pub states: Vec<bool>,
    #[serde(default)]
    pub duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WereAddressesSpentFromResponse {
    pub states: Vec<bool>,
    #[serde(default)]
    pub duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConsistencyResponse {
    pub state: bool,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindTransactionsResponse {
    pub hashes: Vec<String>,
    #[serde(default)]
    pub duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTipsResponse {
    pub hashes: Vec<String>,
    #[serde(default)]
    pub duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNodeInfoResponse {
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub latest_milestone: String,
    #[serde(default)]
    pub latest_milestone_index: u64,
    #[serde(default)]
    pub latest_solid_subtangle_milestone: String,
    #[serde(default)]
    pub latest_solid_subtangle_milestone_index: u64,
    #[serde(default)]
    pub neighbors: i64,
    #[serde(default)]
    pub packets_queue_size: i64,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub tips: i64,
    #[serde(default)]
    pub transactions_to_request: i64,
}

/// The milestone accepted by the freshness vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestSolidSubtangleMilestone {
    #[serde(rename = "latestSolidSubtangleMilestone")]
    pub hash: String,
    #[serde(rename = "latestSolidSubtangleMilestoneIndex")]
    pub index: u64,
}

/// Application-level failure body returned by a node with a non-200 status.
///
/// `code` is the HTTP status of the response the body came from; `error` and
/// `exception` are taken from the body when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestError {
    #[serde(skip)]
    pub code: u16,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub exception: String,
}

impl RequestError {
    /// Decodes an error body. A body that is not a JSON error object still
    /// yields a `RequestError` carrying only the status code.
    #[must_use]
    pub fn from_body(code: u16, body: &[u8]) -> Self {
        let mut error: Self = serde_json::from_slice(body).unwrap_or_default();
        error.code = code;
        error
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.error.is_empty() {
            write!(f, "error message: {};", self.error)?;
        }
        if !self.exception.is_empty() {
            write!(f, "exception message: {};", self.exception)?;
        }
        write!(f, "http status code: {};", self.code)
    }
}

impl std::error::Error for RequestError {}
