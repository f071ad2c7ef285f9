//! On-disk blob store keyed by URL.
//!
//! Each value is one file named by the hex SHA-256 of its URL. Writes go to a
//! temporary file first and are renamed into place, so readers never observe
//! a partial blob. When the total size exceeds the limit, the least recently
//! written files are removed first.
//!
//! Entries never expire by age; HTTP cache-control headers are not honoured.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::traits::{BlobStore, BlobStoreError, BoxFuture, ClearResult};

/// Default disk budget: 2 GB.
pub const DEFAULT_DISK_BYTES: u64 = 2 * 1024 * 1024 * 1024;

const BLOB_EXTENSION: &str = "blob";
const TEMP_EXTENSION: &str = "part";

/// URL-keyed persistent byte cache in a single directory.
pub struct DiskBlobStore {
    directory: PathBuf,
    max_bytes: u64,
    size: AtomicU64,
    trim_lock: Mutex<()>,
}

impl DiskBlobStore {
    /// Open (creating if needed) a store in `directory`.
    ///
    /// Removes partial writes left by interrupted fetches, then scans
    /// existing blobs to seed the size counter.
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory holding the blob files
    /// * `max_bytes` - Size limit enforced on every write
    pub async fn open(directory: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, BlobStoreError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).await?;
        let partials = remove_partials(&directory).await?;
        if partials > 0 {
            debug!(partials, "Removed partial blobs");
        }

        let mut size = 0;
        for (_, len, _) in scan_blobs(&directory).await? {
            size += len;
        }
        info!(
            directory = %directory.display(),
            size_bytes = size,
            max_bytes,
            "Opened disk blob store"
        );

        Ok(Self {
            directory,
            max_bytes,
            size: AtomicU64::new(size),
            trim_lock: Mutex::new(()),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Path of the file that holds `url`'s bytes.
    pub fn blob_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.directory
            .join(format!("{:x}", digest))
            .with_extension(BLOB_EXTENSION)
    }

    async fn read(&self, url: &str) -> Result<Option<Bytes>, BlobStoreError> {
        match fs::read(self.blob_path(url)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, url: &str, data: Bytes) -> Result<(), BlobStoreError> {
        let len = data.len() as u64;
        if len > self.max_bytes {
            return Err(BlobStoreError::ValueTooLarge {
                size: len,
                max: self.max_bytes,
            });
        }

        let path = self.blob_path(url);
        let temp = path.with_extension(TEMP_EXTENSION);
        let previous = match fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        fs::write(&temp, &data).await?;
        fs::rename(&temp, &path).await?;

        let _ = self
            .size
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |size| {
                Some((size + len).saturating_sub(previous))
            });
        debug!(url = %url, bytes = len, "Stored blob");

        if self.size.load(Ordering::SeqCst) > self.max_bytes {
            self.trim(&path).await?;
        }
        Ok(())
    }

    /// Remove oldest blobs, sparing `keep`, until the store fits its limit.
    async fn trim(&self, keep: &Path) -> Result<(), BlobStoreError> {
        let _guard = self.trim_lock.lock().await;

        let mut blobs = scan_blobs(&self.directory).await?;
        let mut total: u64 = blobs.iter().map(|(_, len, _)| len).sum();
        if total <= self.max_bytes {
            self.size.store(total, Ordering::SeqCst);
            return Ok(());
        }

        blobs.sort_by_key(|(_, _, modified)| *modified);
        let mut removed = 0u64;
        for (path, len, _) in blobs {
            if total <= self.max_bytes {
                break;
            }
            if path == keep {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => {
                    total -= len;
                    removed += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to evict blob"),
            }
        }
        self.size.store(total, Ordering::SeqCst);
        debug!(removed, size_bytes = total, "Trimmed disk blob store");
        Ok(())
    }

    async fn remove_all(&self) -> Result<ClearResult, BlobStoreError> {
        let _guard = self.trim_lock.lock().await;

        remove_partials(&self.directory).await?;
        let mut result = ClearResult::default();
        for (path, len, _) in scan_blobs(&self.directory).await? {
            fs::remove_file(&path).await?;
            result.files_deleted += 1;
            result.bytes_freed += len;
        }
        self.size.store(0, Ordering::SeqCst);
        info!(
            files = result.files_deleted,
            bytes = result.bytes_freed,
            "Cleared disk blob store"
        );
        Ok(result)
    }
}

impl BlobStore for DiskBlobStore {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Option<Bytes>, BlobStoreError>> {
        let url = url.to_string();
        Box::pin(async move { self.read(&url).await })
    }

    fn put(&self, url: &str, data: Bytes) -> BoxFuture<'_, Result<(), BlobStoreError>> {
        let url = url.to_string();
        Box::pin(async move { self.write(&url, data).await })
    }

    fn clear(&self) -> BoxFuture<'_, Result<ClearResult, BlobStoreError>> {
        Box::pin(self.remove_all())
    }

    fn size_bytes(&self) -> u64 {
        self.size.load(Ordering::SeqCst)
    }
}

/// Lists `(path, size, modified)` for every blob file in `directory`.
async fn scan_blobs(directory: &Path) -> Result<Vec<(PathBuf, u64, SystemTime)>, BlobStoreError> {
    let mut blobs = Vec::new();
    let mut entries = fs::read_dir(directory).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
            continue;
        }
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        blobs.push((path, meta.len(), modified));
    }
    Ok(blobs)
}

/// Deletes temporary files of writes that never reached their rename.
async fn remove_partials(directory: &Path) -> Result<usize, BlobStoreError> {
    let mut removed = 0;
    let mut entries = fs::read_dir(directory).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(TEMP_EXTENSION) {
            continue;
        }
        match fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial blob"),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::open(dir.path(), 1024).await.unwrap();

        store
            .put("http://a/Norder3/Dir0/Npix1.png", Bytes::from_static(b"abc"))
            .await
            .unwrap();
        let got = store.get("http://a/Norder3/Dir0/Npix1.png").await.unwrap();
        assert_eq!(got.as_deref(), Some(&b"abc"[..]));
        assert_eq!(store.size_bytes(), 3);
        assert!(store.get("http://a/other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_size_accurate() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::open(dir.path(), 1024).await.unwrap();
        store.put("u", Bytes::from(vec![0u8; 100])).await.unwrap();
        store.put("u", Bytes::from(vec![0u8; 40])).await.unwrap();
        assert_eq!(store.size_bytes(), 40);
    }

    #[tokio::test]
    async fn test_reopen_counts_existing_blobs() {
        let dir = TempDir::new().unwrap();
        {
            let store = DiskBlobStore::open(dir.path(), 1024).await.unwrap();
            store.put("a", Bytes::from(vec![1u8; 10])).await.unwrap();
            store.put("b", Bytes::from(vec![1u8; 20])).await.unwrap();
        }
        let store = DiskBlobStore::open(dir.path(), 1024).await.unwrap();
        assert_eq!(store.size_bytes(), 30);
    }

    #[tokio::test]
    async fn test_trim_stays_within_limit() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::open(dir.path(), 100).await.unwrap();
        for i in 0..5 {
            store
                .put(&format!("url-{}", i), Bytes::from(vec![0u8; 40]))
                .await
                .unwrap();
        }
        assert!(store.size_bytes() <= 100);
        // The newest write always survives
        assert!(store.get("url-4").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_value_too_large() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::open(dir.path(), 10).await.unwrap();
        let result = store.put("big", Bytes::from(vec![0u8; 11])).await;
        assert!(matches!(result, Err(BlobStoreError::ValueTooLarge { size: 11, max: 10 })));
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::open(dir.path(), 1024).await.unwrap();
        store.put("a", Bytes::from(vec![1u8; 10])).await.unwrap();
        store.put("b", Bytes::from(vec![1u8; 5])).await.unwrap();

        let result = store.clear().await.unwrap();
        assert_eq!(result.files_deleted, 2);
        assert_eq!(result.bytes_freed, 15);
        assert_eq!(store.size_bytes(), 0);
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_interrupted_writes_are_cleaned_up() {
        let dir = TempDir::new().unwrap();
        let stray = dir.path().join("0123abcd").with_extension(TEMP_EXTENSION);
        std::fs::write(&stray, vec![0u8; 50]).unwrap();

        let store = DiskBlobStore::open(dir.path(), 1024).await.unwrap();
        assert!(!stray.exists());
        assert_eq!(store.size_bytes(), 0);

        // A write cut off after open is removed by clear
        store.put("a", Bytes::from(vec![1u8; 10])).await.unwrap();
        let late = store.blob_path("b").with_extension(TEMP_EXTENSION);
        std::fs::write(&late, vec![0u8; 20]).unwrap();
        let result = store.clear().await.unwrap();
        assert_eq!(result.files_deleted, 1);
        assert!(!late.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_blob_path_is_hashed() {
        let store = DiskBlobStore {
            directory: PathBuf::from("/tmp/x"),
            max_bytes: 1,
            size: AtomicU64::new(0),
            trim_lock: Mutex::new(()),
        };
        let path = store.blob_path("http://example.org/tile.png");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), 64 + 1 + BLOB_EXTENSION.len());
        assert!(name.ends_with(".blob"));
        assert_ne!(path, store.blob_path("http://example.org/tile.jpg"));
    }
}
