//! Integration Tests for the Quorum Executor
//!
//! These tests run the full stack (HTTP transport, fan-out, voting, freshness)
//! against mockito servers standing in for ledger nodes.
//!
//! - `quorum_tests`: majority vote, defaults and error agreement over HTTP
//! - `freshness_tests`: the milestone freshness vote over HTTP
//! - `routing_tests`: exempt commands, primary node and forced kinds
//! - `mock_infrastructure`: reusable node mocks
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod quorum_tests;

#[cfg(test)]
mod freshness_tests;

#[cfg(test)]
mod routing_tests;

/// Mock infrastructure for testing
pub mod mock_infrastructure;
