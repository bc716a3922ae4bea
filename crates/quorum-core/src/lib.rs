//! # Quorum Core
//!
//! Client-side quorum execution for a ledger network made of independently
//! operated nodes that expose the same JSON command API.
//!
//! A single logical command is sent to every configured node, the answers are
//! canonicalized and voted on, and exactly one trusted answer (or a typed
//! failure) is handed back to the caller.
//!
//! - **[`quorum`]**: The [`QuorumExecutor`](quorum::QuorumExecutor), response
//!   canonicalization, the content vote tally and the milestone freshness tracker.
//!
//! - **[`node`]**: The [`NodeCaller`](node::NodeCaller) seam, the reqwest-backed
//!   HTTP caller and the node selection strategy used for exempt commands.
//!
//! - **[`types`]**: Command kinds, the [`Command`](types::Command) request value and
//!   the response shapes the quorum layer needs to understand.
//!
//! - **[`config`]**: Layered configuration loading (defaults, TOML file, environment).
//!
//! - **[`metrics`]**: Counters and histograms for quorum outcomes.
//!
//! ## Request Flow
//!
//! ```text
//! caller
//!   │
//!   ▼
//! ┌────────────────┐
//! │ QuorumExecutor │── exempt kind ──► primary / selected node ──► verbatim result
//! └───────┬────────┘
//!         │ fan-out to every node (full barrier)
//!         ▼
//! ┌────────────────┐
//! │ tolerance check│── too many failures ──► ExceededNoResponseTolerance
//! └───────┬────────┘
//!    ┌────┴─────────────┐
//!    ▼                  ▼
//! canonicalize      scan milestone
//! + vote tally      + min/max tracker
//!    │                  │
//!    ▼                  ▼
//! threshold?        delta bound?
//!    │                  │
//!    ▼                  ▼
//! result / default  lowest (index, hash)
//! ```

pub mod config;
pub mod metrics;
pub mod node;
pub mod quorum;
pub mod types;
pub mod utils;

pub use node::{HttpNodeCaller, NodeCaller, NodeError, NodeReply};
pub use quorum::{QuorumConfig, QuorumError, QuorumExecutor, QuorumResult};
pub use types::{Command, CommandKind};
