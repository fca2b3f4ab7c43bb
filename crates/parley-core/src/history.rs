//! Append-only offer history.

use serde::{Deserialize, Serialize};

use crate::outcome_space::BidDetails;

/// Ordered log of the bids one party made during a session.
///
/// Bids are only ever appended; index 0 is the first bid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidHistory {
    bids: Vec<BidDetails>,
}

impl BidHistory {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self { bids: Vec::new() }
    }

    /// Appends a bid.
    pub fn push(&mut self, bid: BidDetails) {
        self.bids.push(bid);
    }

    /// Returns the number of recorded bids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bids.len()
    }

    /// Returns true if no bid has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }

    /// Returns the bid at `index` (0 = first).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&BidDetails> {
        self.bids.get(index)
    }

    /// Returns the most recent bid.
    #[must_use]
    pub fn last(&self) -> Option<&BidDetails> {
        self.bids.last()
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BidDetails> {
        self.bids.iter()
    }

    /// Iterates over at most `n` bids, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &BidDetails> {
        self.bids.iter().rev().take(n)
    }
}
