//! Claim tracker: the monotonic set of allocated positions.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::index::Position;

/// Set of claimed record positions.
///
/// `claim` is a single test-and-set under the write lock, so among any number
/// of concurrent callers for one position exactly one observes `true`.
#[derive(Debug, Default)]
pub struct ClaimTracker {
    claimed: RwLock<HashSet<Position>>,
}

impl ClaimTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `position` claimed. Returns `true` only on the transition.
    pub fn claim(&self, position: Position) -> bool {
        self.claimed.write().insert(position)
    }

    pub fn is_claimed(&self, position: Position) -> bool {
        self.claimed.read().contains(&position)
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.read().len()
    }
}
