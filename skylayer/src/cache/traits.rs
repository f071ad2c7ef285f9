//! Persistent byte store interface.
//!
//! The `BlobStore` trait is the seam between the downloader and whatever
//! keeps raw tile bytes across sessions. Keys are the tile URLs, values the
//! undecoded response bodies.
//!
//! # Dyn Compatibility
//!
//! Async methods return `Pin<Box<dyn Future>>` so the downloader can hold an
//! `Arc<dyn BlobStore>` without being generic over the store.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use thiserror::Error;

/// Result of clearing a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearResult {
    /// Number of files removed.
    pub files_deleted: u64,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl fmt::Display for ClearResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed {} files, freed {} bytes",
            self.files_deleted, self.bytes_freed
        )
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// I/O error on the backing directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value exceeds maximum allowed size.
    #[error("Value too large: {size} bytes (max: {max})")]
    ValueTooLarge { size: u64, max: u64 },
}

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// URL-keyed persistent byte cache.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; fetch tasks share one store.
pub trait BlobStore: Send + Sync {
    /// Retrieve the bytes stored for `url`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(data))` if present
    /// - `Ok(None)` if not stored
    /// - `Err(_)` if the store could not be read
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Option<Bytes>, BlobStoreError>>;

    /// Store `data` for `url`, replacing any previous value.
    ///
    /// Implementations may evict older values to stay within their limit.
    fn put(&self, url: &str, data: Bytes) -> BoxFuture<'_, Result<(), BlobStoreError>>;

    /// Remove every stored value.
    fn clear(&self) -> BoxFuture<'_, Result<ClearResult, BlobStoreError>>;

    /// Current total size of stored values in bytes.
    fn size_bytes(&self) -> u64;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store for tests.
    #[derive(Default)]
    pub struct MemoryBlobStore {
        data: Mutex<HashMap<String, Bytes>>,
        pub gets: AtomicUsize,
    }

    impl MemoryBlobStore {
        pub fn with_entry(url: &str, data: &[u8]) -> Self {
            let store = Self::default();
            store
                .data
                .lock()
                .unwrap()
                .insert(url.to_string(), Bytes::copy_from_slice(data));
            store
        }

        pub fn contains(&self, url: &str) -> bool {
            self.data.lock().unwrap().contains_key(url)
        }
    }

    impl BlobStore for MemoryBlobStore {
        fn get(&self, url: &str) -> BoxFuture<'_, Result<Option<Bytes>, BlobStoreError>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            let value = self.data.lock().unwrap().get(url).cloned();
            Box::pin(async move { Ok(value) })
        }

        fn put(&self, url: &str, data: Bytes) -> BoxFuture<'_, Result<(), BlobStoreError>> {
            self.data.lock().unwrap().insert(url.to_string(), data);
            Box::pin(async { Ok(()) })
        }

        fn clear(&self) -> BoxFuture<'_, Result<ClearResult, BlobStoreError>> {
            let mut data = self.data.lock().unwrap();
            let result = ClearResult {
                files_deleted: data.len() as u64,
                bytes_freed: data.values().map(|v| v.len() as u64).sum(),
            };
            data.clear();
            Box::pin(async move { Ok(result) })
        }

        fn size_bytes(&self) -> u64 {
            self.data
                .lock()
                .unwrap()
                .values()
                .map(|v| v.len() as u64)
                .sum()
        }
    }

    #[test]
    fn test_clear_result_display() {
        let result = ClearResult {
            files_deleted: 10,
            bytes_freed: 1024,
        };
        let display = format!("{}", result);
        assert!(display.contains("10"));
        assert!(display.contains("1024"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BlobStoreError = io_err.into();
        assert!(matches!(err, BlobStoreError::Io(_)));
    }

    #[test]
    fn test_value_too_large_display() {
        let err = BlobStoreError::ValueTooLarge { size: 100, max: 50 };
        assert!(format!("{}", err).contains("100"));
        assert!(format!("{}", err).contains("50"));
    }
}
