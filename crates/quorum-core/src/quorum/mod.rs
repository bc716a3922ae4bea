//! # Quorum Algorithm Overview
//!
//! The executor sends one logical command to several independently operated
//! nodes and turns their (possibly inconsistent, possibly missing) answers into
//! a single trusted result.
//!
//! ## Routing
//!
//! Chosen once per call, evaluated in order:
//!
//! 1. **Freshness vote**: the latest solid subtangle milestone query
//! 2. **Direct**: exempt kinds (tip selection, attach, broadcast, store, ...) that
//!    are not listed in `forced_quorum_kinds` go to the primary node, or to one
//!    node picked by the [`NodeSelector`](crate::node::NodeSelector)
//! 3. **Majority vote**: everything else
//!
//! ## Majority Vote
//!
//! 1. **Fan-out**: the serialized command goes to every node; all calls complete
//!    before anything is decided
//! 2. **Tolerance**: abort if the failed fraction exceeds `no_response_tolerance`
//! 3. **Canonicalize**: strip fields that legitimately differ between nodes
//! 4. **Tally**: count votes per content key, keep the first-seen body
//! 5. **Decide**: the largest group must reach `threshold` of the responding
//!    nodes; otherwise a configured default or `QuorumNotReached`
//!
//! ## Freshness Vote
//!
//! Every node's milestone `(index, hash)` is scanned out of its node info.
//! If highest and lowest index are at most `max_freshness_delta` apart, the
//! lowest observation wins: every other node has already reached it.
//!
//! # Module Organization
//!
//! - [`config`]: `QuorumConfig`, `QuorumDefaults`, `QuorumLevel`
//! - [`errors`]: `QuorumError` taxonomy
//! - [`canonical`]: response canonicalization and vote keys
//! - [`tally`]: concurrent content vote tally
//! - [`freshness`]: milestone extraction and min/max tracking
//! - [`types`]: result and metadata types
//! - [`engine`]: `QuorumExecutor` orchestration

pub mod canonical;
pub mod config;
pub mod engine;
pub mod errors;
pub mod freshness;
pub mod tally;
pub mod types;

#[cfg(test)]
mod tests;

pub use canonical::ResponseCanonicalizer;
pub use config::{QuorumConfig, QuorumDefaults, QuorumLevel};
pub use engine::QuorumExecutor;
pub use errors::QuorumError;
pub use freshness::{
    FreshnessBounds, FreshnessObservation, FreshnessTracker, MilestoneExtractor, MilestoneScanError,
    ScanningExtractor, StructuredExtractor,
};
pub use tally::{ContentVoteTally, VoteEntry};
pub use types::{QuorumMetadata, QuorumResult, ResultSource, Strategy};
