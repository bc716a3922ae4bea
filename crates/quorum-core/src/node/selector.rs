//! Node selection for commands that are not voted on.

use rand::Rng;

/// Picks which configured node answers a command that bypasses the vote
/// when no primary node is configured.
pub trait NodeSelector: Send + Sync {
    /// Returns an index in `0..node_count`. `node_count` is never zero.
    fn select(&self, node_count: usize) -> usize;
}

/// Uniformly random selection.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl NodeSelector for RandomSelector {
    fn select(&self, node_count: usize) -> usize {
        rand::rng().random_range(0..node_count)
    }
}

/// Always selects the same index (wrapped into range).
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector(pub usize);

impl NodeSelector for FixedSelector {
    fn select(&self, node_count: usize) -> usize {
        self.0 % node_count
    }
}
