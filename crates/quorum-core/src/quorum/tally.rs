use ahash::AHashMap;
use bytes::Bytes;
use parking_lot::Mutex;

/// One group of nodes whose canonical responses hashed to the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEntry {
    /// Number of nodes in the group.
    pub votes: usize,
    /// Raw body of the first response recorded for the group.
    pub body: Bytes,
    /// HTTP status of that first response.
    pub status: u16,
    /// Lowest configured node index in the group; breaks ties between groups.
    pub lowest_node: usize,
}

/// Vote counts per content key, shared by concurrently completing node calls.
///
/// The representative body of a group is the first one recorded and is never
/// replaced, so once a key has a body every later vote only increments the
/// count.
#[derive(Debug, Default)]
pub struct ContentVoteTally {
    groups: Mutex<AHashMap<u64, VoteEntry>>,
}

impl ContentVoteTally {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { groups: Mutex::new(AHashMap::with_capacity(capacity)) }
    }

    /// Records one node's vote.
    pub fn record(&self, key: u64, node: usize, body: Bytes, status: u16) {
        let mut groups = self.groups.lock();
        groups
            .entry(key)
            .and_modify(|entry| {
                entry.votes += 1;
                entry.lowest_node = entry.lowest_node.min(node);
            })
            .or_insert(VoteEntry { votes: 1, body, status, lowest_node: node });
    }

    /// Total number of recorded votes.
    #[cfg(test)]
    #[must_use]
    pub fn total_votes(&self) -> usize {
        self.groups.lock().values().map(|entry| entry.votes).sum()
    }

    #[cfg(test)]
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.lock().len()
    }

    /// Consumes the tally and returns the largest group.
    ///
    /// Equal vote counts resolve to the group containing the lowest configured
    /// node index, which keeps the outcome independent of arrival order.
    #[must_use]
    pub fn into_winner(self) -> Option<VoteEntry> {
        self.groups
            .into_inner()
            .into_values()
            .max_by(|a, b| a.votes.cmp(&b.votes).then_with(|| b.lowest_node.cmp(&a.lowest_node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counts_and_keeps_first_body() {
        let tally = ContentVoteTally::default();
        tally.record(1, 2, Bytes::from_static(b"first"), 200);
        tally.record(1, 0, Bytes::from_static(b"second"), 200);
        tally.record(7, 1, Bytes::from_static(b"other"), 200);

        assert_eq!(tally.total_votes(), 3);
        assert_eq!(tally.group_count(), 2);

        let winner = tally.into_winner().unwrap();
        assert_eq!(winner.votes, 2);
        assert_eq!(winner.body, Bytes::from_static(b"first"));
        assert_eq!(winner.lowest_node, 0);
    }

    #[test]
    fn test_tie_resolves_to_lowest_node() {
        let tally = ContentVoteTally::default();
        tally.record(10, 3, Bytes::from_static(b"b"), 200);
        tally.record(20, 0, Bytes::from_static(b"a"), 200);
        tally.record(10, 2, Bytes::from_static(b"b"), 200);
        tally.record(20, 1, Bytes::from_static(b"a"), 200);

        let winner = tally.into_winner().unwrap();
        assert_eq!(winner.body, Bytes::from_static(b"a"));
        assert_eq!(winner.votes, 2);
    }

    #[test]
    fn test_empty_tally_has_no_winner() {
        assert!(ContentVoteTally::default().into_winner().is_none());
    }

    #[test]
    fn test_concurrent_recording() {
        let tally = Arc::new(ContentVoteTally::with_capacity(4));
        let handles: Vec<_> = (0..8)
            .map(|node| {
                let tally = Arc::clone(&tally);
                std::thread::spawn(move || {
                    tally.record((node % 2) as u64, node, Bytes::from_static(b"x"), 200);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tally.total_votes(), 8);
        let tally = Arc::try_unwrap(tally).unwrap();
        let winner = tally.into_winner().unwrap();
        assert_eq!(winner.votes, 4);
        assert_eq!(winner.lowest_node, 0);
    }
}
