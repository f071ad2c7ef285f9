//! Tile caching.
//!
//! Two layers:
//!
//! - [`TileCache`]: decoded tiles in memory, bounded by total byte cost with
//!   least-recently-used eviction. Owned by the tile manager's thread.
//! - [`BlobStore`] / [`DiskBlobStore`]: raw response bytes on disk, keyed by
//!   URL, consulted by the downloader before going to the network.

mod disk;
mod memory;
mod traits;

pub use disk::{DiskBlobStore, DEFAULT_DISK_BYTES};
pub use memory::{CacheStats, EntryTooLarge, TileCache, DEFAULT_MAX_COST};
pub use traits::{BlobStore, BlobStoreError, BoxFuture, ClearResult};

#[cfg(test)]
pub use traits::tests::MemoryBlobStore;
