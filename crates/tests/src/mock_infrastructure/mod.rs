//! Mock Infrastructure for Testing the Quorum Executor
//!
//! ## Components
//!
//! - `NodeMockBuilder`: wraps mockito to answer node commands
//! - Test helpers for building executors over several mocks
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{executor_for, start_nodes};
//!
//! let mut nodes = start_nodes(3).await;
//! for node in &mut nodes {
//!     node.mock_command("getBalances", 200, &json!({"balances": ["10"]}));
//! }
//!
//! let executor = executor_for(&nodes, QuorumConfig::default());
//! ```

pub mod node_mock;
pub mod test_helpers;

pub use node_mock::NodeMockBuilder;
pub use test_helpers::*;
