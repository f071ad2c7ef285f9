//! Per-key download state.

use std::time::Instant;

use crate::download::FetchId;
use crate::tile::TileKey;

/// Where a tile stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// Not cached and free to be requested.
    Unrequested,
    /// A fetch is outstanding.
    Downloading,
    /// Decoded and available.
    Cached,
    /// Last fetch failed; blocked until the grace period ends.
    Failed,
}

/// Entry of the pending set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingState {
    Downloading { id: FetchId },
    Failed { retry_at: Instant },
}

impl PendingState {
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        matches!(self, PendingState::Failed { retry_at } if *retry_at <= now)
    }
}

/// Outcome of processing one download event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Tile decoded and inserted into the cache.
    Cached { key: TileKey },
    /// Tile decoded but too large to cache; held for one use.
    Oversized { key: TileKey },
    /// Fetch or decode failed; retry allowed after `retry_at`.
    Failed { key: TileKey, retry_at: Instant },
    /// Fetch was cancelled; the key is free again.
    Cancelled { key: TileKey },
    /// Event no longer matches the pending set and was dropped.
    Stale { key: TileKey },
}

impl Completion {
    pub fn key(&self) -> TileKey {
        match self {
            Completion::Cached { key }
            | Completion::Oversized { key }
            | Completion::Failed { key, .. }
            | Completion::Cancelled { key }
            | Completion::Stale { key } => *key,
        }
    }

    /// Whether a new tile became available, so the view should be redrawn.
    pub fn needs_repaint(&self) -> bool {
        matches!(self, Completion::Cached { .. } | Completion::Oversized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_failed_expiry() {
        let now = Instant::now();
        let failed = PendingState::Failed {
            retry_at: now + Duration::from_secs(5),
        };
        assert!(!failed.is_expired(now));
        assert!(failed.is_expired(now + Duration::from_secs(5)));
        assert!(!PendingState::Downloading { id: FetchId::new(1) }.is_expired(now));
    }

    #[test]
    fn test_completion_repaint() {
        let key = TileKey::new(3, 0, 1);
        assert!(Completion::Cached { key }.needs_repaint());
        assert!(Completion::Oversized { key }.needs_repaint());
        assert!(!Completion::Cancelled { key }.needs_repaint());
        assert_eq!(Completion::Stale { key }.key(), key);
    }
}
