//! Asynchronous tile fetching.
//!
//! The [`Downloader`] spawns one Tokio task per fetch and reports every
//! completion exactly once as a [`DownloadEvent`] on an unbounded channel.
//! The owner of the receiving end (the tile manager) processes events on its
//! own thread; nothing here touches the tile cache.
//!
//! A persistent [`BlobStore`] is consulted before the network and receives
//! every successful response. Store failures are logged and never fail a
//! fetch. There is no retry: failures complete with an error and retry
//! policy belongs to the caller.
//!
//! # Example
//!
//! ```ignore
//! use skylayer::download::{Downloader, DownloadConfig, FetchId};
//!
//! let (downloader, mut events) = Downloader::with_reqwest(&DownloadConfig::default(), None)?;
//! downloader.fetch(FetchId::new(1), key, url);
//! let event = events.recv().await;
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::BlobStore;
use crate::provider::{AsyncHttpClient, AsyncReqwestClient, FetchError, DEFAULT_TIMEOUT};
use crate::tile::TileKey;

#[cfg(test)]
pub use tests::RecordingFetcher;

/// Identity of one fetch, allocated by the requester and echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchId(u64);

impl FetchId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The id after this one.
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for FetchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Completion of one fetch.
#[derive(Debug, Clone)]
pub struct DownloadEvent {
    pub id: FetchId,
    pub key: TileKey,
    pub url: String,
    pub result: Result<Bytes, FetchError>,
}

/// Receiving end of the completion channel.
pub type DownloadEvents = mpsc::UnboundedReceiver<DownloadEvent>;

/// Downloader settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl DownloadConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Something that can fetch tile bytes and report back asynchronously.
///
/// Implemented by [`Downloader`]; tests substitute a recording fetcher.
pub trait TileFetcher {
    /// Begin fetching `url`. Completion arrives later as a [`DownloadEvent`]
    /// carrying `id` and `key`.
    fn fetch(&self, id: FetchId, key: TileKey, url: String);

    /// Cancel every outstanding fetch. Each one still completes, with
    /// [`FetchError::Cancelled`].
    fn abort_all(&mut self);

    /// Number of fetches that have not completed yet.
    fn in_flight(&self) -> usize;

    /// Persistent store backing this fetcher, if any.
    fn store(&self) -> Option<Arc<dyn BlobStore>> {
        None
    }
}

/// Tokio-based fetcher over an [`AsyncHttpClient`].
///
/// `fetch` must be called from within a Tokio runtime.
pub struct Downloader<C: AsyncHttpClient> {
    client: Arc<C>,
    store: Option<Arc<dyn BlobStore>>,
    events: mpsc::UnboundedSender<DownloadEvent>,
    cancel: CancellationToken,
    in_flight: Arc<AtomicUsize>,
}

impl<C: AsyncHttpClient> Downloader<C> {
    /// Create a downloader and the receiver for its completions.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for network fetches
    /// * `store` - Optional persistent store checked before the network
    pub fn new(client: C, store: Option<Arc<dyn BlobStore>>) -> (Self, DownloadEvents) {
        let (events, receiver) = mpsc::unbounded_channel();
        let downloader = Self {
            client: Arc::new(client),
            store,
            events,
            cancel: CancellationToken::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        };
        (downloader, receiver)
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl Downloader<AsyncReqwestClient> {
    /// Create a downloader backed by reqwest.
    pub fn with_reqwest(
        config: &DownloadConfig,
        store: Option<Arc<dyn BlobStore>>,
    ) -> Result<(Self, DownloadEvents), FetchError> {
        let client = AsyncReqwestClient::with_timeout(config.timeout)?;
        Ok(Self::new(client, store))
    }
}

impl<C: AsyncHttpClient> TileFetcher for Downloader<C> {
    fn fetch(&self, id: FetchId, key: TileKey, url: String) {
        let client = Arc::clone(&self.client);
        let store = self.store.clone();
        let events = self.events.clone();
        let token = self.cancel.child_token();
        let in_flight = Arc::clone(&self.in_flight);

        in_flight.fetch_add(1, Ordering::SeqCst);
        debug!(id = %id, key = %key, url = %url, "Fetch started");

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Cancelled),
                result = fetch_bytes(client.as_ref(), store.as_deref(), &url) => result,
            };
            in_flight.fetch_sub(1, Ordering::SeqCst);

            match &result {
                Ok(bytes) => debug!(id = %id, url = %url, bytes = bytes.len(), "Fetch completed"),
                Err(FetchError::Cancelled) => debug!(id = %id, url = %url, "Fetch cancelled"),
                Err(e) => warn!(id = %id, url = %url, error = %e, "Fetch failed"),
            }

            if events
                .send(DownloadEvent {
                    id,
                    key,
                    url,
                    result,
                })
                .is_err()
            {
                debug!(id = %id, "Completion receiver dropped");
            }
        });
    }

    fn abort_all(&mut self) {
        let outstanding = self.in_flight();
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        info!(outstanding, "Aborted all fetches");
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn store(&self) -> Option<Arc<dyn BlobStore>> {
        self.store.clone()
    }
}

/// Store lookup, then network, then store write-back.
async fn fetch_bytes<C: AsyncHttpClient>(
    client: &C,
    store: Option<&dyn BlobStore>,
    url: &str,
) -> Result<Bytes, FetchError> {
    if let Some(store) = store {
        match store.get(url).await {
            Ok(Some(bytes)) => {
                debug!(url = %url, "Served from disk cache");
                return Ok(bytes);
            }
            Ok(None) => {}
            Err(e) => warn!(url = %url, error = %e, "Disk cache read failed"),
        }
    }

    let bytes = client.get(url).await?;

    if let Some(store) = store {
        if let Err(e) = store.put(url, bytes.clone()).await {
            warn!(url = %url, error = %e, "Disk cache write failed");
        }
    }
    Ok(bytes)
}
