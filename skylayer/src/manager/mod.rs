//! Tile manager: cache, pending set, and download orchestration.
//!
//! The manager answers "give me the tile for this pixel" without ever
//! blocking. A cache hit is returned at once; a miss starts exactly one fetch
//! for the key and returns nothing, and later calls for the same key may be
//! served a quadrant of the cached parent tile while the fetch is under way.
//!
//! Completions arrive as [`DownloadEvent`]s and are applied by
//! [`TileManager::poll_completions`] or [`TileManager::next_completion`] on the
//! thread that owns the manager. A key moves through
//! `Unrequested -> Downloading -> {Cached | Failed}`; a failed key is blocked
//! for the retry grace period, a cancelled one is released immediately.
//!
//! # Example
//!
//! ```ignore
//! use skylayer::manager::{TileManager, TileManagerConfig};
//! use skylayer::download::{Downloader, DownloadConfig};
//! use skylayer::tile::TileRequest;
//!
//! let (downloader, events) = Downloader::with_reqwest(&DownloadConfig::default(), None)?;
//! let mut manager = TileManager::new(downloader, events, TileManagerConfig::default());
//! manager.set_source(Some(source));
//!
//! assert!(manager.request_tile(TileRequest::tile(3, 0), true)?.is_none());
//! manager.next_completion().await;
//! let tile = manager.request_tile(TileRequest::tile(3, 0), true)?;
//! ```

mod config;
mod error;
mod state;

pub use config::{TileManagerConfig, DEFAULT_RETRY_GRACE};
pub use error::{decode_tile, DecodeError};
pub use state::{Completion, TileState};

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cache::{BlobStoreError, CacheStats, ClearResult, TileCache};
use crate::download::{DownloadEvent, DownloadEvents, FetchId, TileFetcher};
use crate::healpix::IndexError;
use crate::provider::FetchError;
use crate::source::SurveySource;
use crate::tile::{
    allsky_url, crop_allsky_cell, crop_quadrant, image_cost, tile_url, TileImage, TileKey,
    TileRequest,
};

use state::PendingState;

/// The active survey and its derived key scope.
struct ActiveSource {
    source: SurveySource,
    id: u64,
}

/// Orchestrates tile lookups, downloads, and caching for one survey at a time.
pub struct TileManager<F: TileFetcher> {
    fetcher: F,
    events: DownloadEvents,
    cache: TileCache,
    pending: HashMap<TileKey, PendingState>,
    /// Most recent tile too large for the cache, served at most once.
    oversized: Option<(TileKey, TileImage)>,
    source: Option<ActiveSource>,
    next_id: FetchId,
    config: TileManagerConfig,
}

impl<F: TileFetcher> TileManager<F> {
    /// Create a manager with no active survey.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Starts fetches; completions must arrive on `events`
    /// * `events` - Receiving end of the fetcher's completion channel
    /// * `config` - Cache budget and retry grace period
    pub fn new(fetcher: F, events: DownloadEvents, config: TileManagerConfig) -> Self {
        Self {
            fetcher,
            events,
            cache: TileCache::new(config.max_cost),
            pending: HashMap::new(),
            oversized: None,
            source: None,
            next_id: FetchId::new(1),
            config,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn config(&self) -> &TileManagerConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&SurveySource> {
        self.source.as_ref().map(|active| &active.source)
    }

    /// Replace the active survey. `None` disables all requests.
    ///
    /// Outstanding fetches are cancelled and the memory cache is dropped
    /// when the survey actually changes; keys of the old survey could never
    /// match again anyway.
    pub fn set_source(&mut self, source: Option<SurveySource>) {
        let new_id = source.as_ref().map(SurveySource::source_id);
        if new_id == self.source.as_ref().map(|active| active.id) {
            self.source = source.map(|source| ActiveSource {
                id: source.source_id(),
                source,
            });
            return;
        }

        self.cancel_all();
        self.cache.clear();
        self.oversized = None;

        match &source {
            Some(s) => info!(id = %s.id, title = %s.title, url = %s.base_url, "Survey source set"),
            None => info!("Survey source disabled"),
        }
        self.source = source.map(|source| ActiveSource {
            id: source.source_id(),
            source,
        });
    }

    /// Get the tile for `request`, starting a fetch on a miss.
    ///
    /// Never blocks. Plain cache hits are borrowed from the cache; all-sky
    /// cells, parent-quadrant fallbacks, and one-shot oversized tiles are
    /// owned copies.
    ///
    /// # Arguments
    ///
    /// * `request` - Pixel to fetch, or an all-sky cell
    /// * `allow_fallback` - Serve a quadrant of the cached parent while
    ///   this tile is downloading or blocked
    ///
    /// # Returns
    ///
    /// `Ok(None)` when nothing can be shown yet, including when no survey is
    /// active or the level exceeds the survey's maximum.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the pixel is out of range for its level.
    pub fn request_tile(
        &mut self,
        request: TileRequest,
        allow_fallback: bool,
    ) -> Result<Option<Cow<'_, TileImage>>, IndexError> {
        request.validate()?;

        let Some(active) = &self.source else {
            debug!(level = request.level(), pix = request.pix(), "No survey source");
            return Ok(None);
        };
        if !request.is_allsky() && request.level() > active.source.max_level {
            debug!(
                level = request.level(),
                max_level = active.source.max_level,
                "Level above survey maximum"
            );
            return Ok(None);
        }
        let key = request.key(active.id);

        if self.oversized.as_ref().is_some_and(|(held, _)| *held == key) {
            if let Some((_, image)) = self.oversized.take() {
                debug!(key = %key, "Serving oversized tile once");
                return Ok(finish(request, Cow::Owned(image)));
            }
        }

        if self.cache.get(&key).is_some() {
            return Ok(self
                .cache
                .peek(&key)
                .and_then(|image| finish(request, Cow::Borrowed(image))));
        }

        let now = Instant::now();
        match self.pending.get(&key) {
            None => {
                self.start_fetch(key);
                Ok(None)
            }
            Some(state) if state.is_expired(now) => {
                debug!(key = %key, "Retrying after grace period");
                self.start_fetch(key);
                Ok(None)
            }
            Some(_) if allow_fallback => Ok(self.parent_fallback(&key)),
            Some(_) => Ok(None),
        }
    }

    /// Current lifecycle state of a request under the active survey.
    pub fn tile_state(&self, request: TileRequest) -> TileState {
        let Some(active) = &self.source else {
            return TileState::Unrequested;
        };
        let key = request.key(active.id);
        let held = self.oversized.as_ref().is_some_and(|(held, _)| *held == key);
        if self.cache.contains(&key) || held {
            return TileState::Cached;
        }
        match self.pending.get(&key) {
            None => TileState::Unrequested,
            Some(state) if state.is_expired(Instant::now()) => TileState::Unrequested,
            Some(PendingState::Downloading { .. }) => TileState::Downloading,
            Some(PendingState::Failed { .. }) => TileState::Failed,
        }
    }

    /// Apply every completion already delivered, without waiting.
    ///
    /// Failed keys past their grace period are released first. Returns how
    /// many completions produced a new tile.
    pub fn poll_completions(&mut self) -> usize {
        self.expire_failures();
        let mut repaint = 0;
        while let Ok(event) = self.events.try_recv() {
            if self.handle_event(event).needs_repaint() {
                repaint += 1;
            }
        }
        repaint
    }

    /// Wait for the next completion and apply it.
    ///
    /// Returns `None` once the fetcher has shut down.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let event = self.events.recv().await?;
        Some(self.handle_event(event))
    }

    /// Release failed keys whose grace period has ended.
    ///
    /// Returns how many were released.
    pub fn expire_failures(&mut self) -> usize {
        let now = Instant::now();
        let before = self.pending.len();
        self.pending.retain(|key, state| {
            let expired = state.is_expired(now);
            if expired {
                debug!(key = %key, "Failure grace period elapsed");
            }
            !expired
        });
        before - self.pending.len()
    }

    /// Cancel all outstanding fetches and release their keys at once.
    pub fn cancel_all(&mut self) {
        let released = self
            .pending
            .values()
            .filter(|state| matches!(state, PendingState::Downloading { .. }))
            .count();
        self.fetcher.abort_all();
        self.pending
            .retain(|_, state| matches!(state, PendingState::Failed { .. }));
        if released > 0 {
            info!(released, "Cancelled pending downloads");
        }
    }

    /// Drop every decoded tile from memory.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.oversized = None;
    }

    /// Remove every blob from the fetcher's persistent store.
    pub async fn clear_disk_cache(&self) -> Result<ClearResult, BlobStoreError> {
        match self.fetcher.store() {
            Some(store) => store.clear().await,
            None => Ok(ClearResult::default()),
        }
    }

    /// Bytes held by the fetcher's persistent store.
    pub fn disk_cache_size(&self) -> u64 {
        self.fetcher
            .store()
            .map(|store| store.size_bytes())
            .unwrap_or(0)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn used_cost(&self) -> usize {
        self.cache.used_cost()
    }

    /// Change the memory budget, evicting at once if it shrank.
    pub fn set_max_cost(&mut self, max_cost: usize) {
        self.config.max_cost = max_cost;
        self.cache.set_max_cost(max_cost);
    }

    /// Bytes held outside the cache budget by an unserved oversized tile.
    pub fn oversized_cost(&self) -> usize {
        self.oversized
            .as_ref()
            .map(|(_, image)| image_cost(image))
            .unwrap_or(0)
    }

    /// Number of keys downloading or blocked after a failure.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn start_fetch(&mut self, key: TileKey) {
        let Some(active) = &self.source else {
            return;
        };
        let source = &active.source;
        let url = if key.is_allsky() {
            allsky_url(&source.base_url, source.format)
        } else {
            tile_url(&source.base_url, key.level, key.pix, source.format)
        };

        let id = self.next_id;
        self.next_id = id.next();
        self.pending.insert(key, PendingState::Downloading { id });
        debug!(key = %key, id = %id, url = %url, "Requesting tile");
        self.fetcher.fetch(id, key, url);
    }

    fn parent_fallback(&mut self, key: &TileKey) -> Option<Cow<'_, TileImage>> {
        let parent = key.parent()?;
        let image = self.cache.get(&parent)?;
        crop_quadrant(image, key.pix).map(Cow::Owned)
    }

    fn handle_event(&mut self, event: DownloadEvent) -> Completion {
        let DownloadEvent {
            id, key, url, result,
        } = event;

        match self.pending.get(&key) {
            Some(PendingState::Downloading { id: pending }) if *pending == id => {}
            _ => {
                debug!(key = %key, id = %id, "Ignoring stale completion");
                return Completion::Stale { key };
            }
        }

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(FetchError::Cancelled) => {
                self.pending.remove(&key);
                return Completion::Cancelled { key };
            }
            Err(e) => {
                warn!(key = %key, url = %url, error = %e, "Tile download failed");
                return self.mark_failed(key);
            }
        };

        let expected_width = match &self.source {
            Some(active) if active.id == key.source_id && !key.is_allsky() => {
                Some(active.source.tile_width)
            }
            _ => None,
        };
        let image = match decode_tile(&bytes, expected_width) {
            Ok(image) => image,
            Err(e) => {
                warn!(key = %key, url = %url, error = %e, "Tile decode failed");
                return self.mark_failed(key);
            }
        };

        self.pending.remove(&key);
        let cost = image_cost(&image);
        match self.cache.put(key, image, cost) {
            Ok(()) => {
                debug!(key = %key, cost, used = self.cache.used_cost(), "Tile cached");
                Completion::Cached { key }
            }
            Err(too_large) => {
                warn!(key = %key, error = %too_large, "Tile too large to cache");
                if let Some((dropped, _)) = self.oversized.replace((key, too_large.into_image())) {
                    debug!(key = %dropped, "Dropped unserved oversized tile");
                }
                Completion::Oversized { key }
            }
        }
    }

    fn mark_failed(&mut self, key: TileKey) -> Completion {
        let retry_at = Instant::now() + self.config.retry_grace;
        self.pending.insert(key, PendingState::Failed { retry_at });
        Completion::Failed { key, retry_at }
    }
}

/// Cut the requested cell out of an all-sky composite; pass tiles through.
fn finish(request: TileRequest, image: Cow<'_, TileImage>) -> Option<Cow<'_, TileImage>> {
    if request.is_allsky() {
        crop_allsky_cell(&image, request.pix()).map(Cow::Owned)
    } else {
        Some(image)
    }
}
