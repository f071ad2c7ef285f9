//! Configuration for the tile manager.

use std::time::Duration;

use crate::cache::DEFAULT_MAX_COST;

/// Delay before a failed tile may be requested again.
pub const DEFAULT_RETRY_GRACE: Duration = Duration::from_secs(5);

/// Configuration for the tile manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileManagerConfig {
    /// Maximum total byte cost of decoded tiles held in memory.
    pub max_cost: usize,

    /// How long a failed key stays blocked before it can be retried.
    ///
    /// Cancelled fetches are never delayed.
    pub retry_grace: Duration,
}

impl Default for TileManagerConfig {
    fn default() -> Self {
        Self {
            max_cost: DEFAULT_MAX_COST,
            retry_grace: DEFAULT_RETRY_GRACE,
        }
    }
}

impl TileManagerConfig {
    /// Set the memory cache budget.
    pub fn with_max_cost(mut self, max_cost: usize) -> Self {
        self.max_cost = max_cost;
        self
    }

    /// Set the retry grace period.
    pub fn with_retry_grace(mut self, retry_grace: Duration) -> Self {
        self.retry_grace = retry_grace;
        self
    }
}
