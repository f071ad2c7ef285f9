//! Tile lookup request types.
//!
//! Provides the `TileRequest` type that describes what the renderer wants
//! drawn: either a regular tile, or one cell of the survey's all-sky
//! composite.

use crate::healpix::{self, IndexResult};

use super::{TileKey, ALLSKY_LEVEL};

/// Request for the image covering one sky pixel.
///
/// # Example
///
/// ```
/// use skylayer::tile::TileRequest;
///
/// let request = TileRequest::tile(5, 1234);
/// assert_eq!(request.level(), 5);
/// assert!(!request.is_allsky());
///
/// let cell = TileRequest::allsky(17);
/// assert_eq!(cell.level(), 3);
/// assert!(cell.is_allsky());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRequest {
    /// Resolution level
    level: u8,
    /// Nested pixel index at `level`
    pix: u64,
    /// Serve from the all-sky composite instead of a regular tile
    allsky: bool,
}

impl TileRequest {
    /// Request a regular tile.
    ///
    /// # Arguments
    ///
    /// * `level` - Resolution level (HiPS order)
    /// * `pix` - Nested pixel index at that level
    pub fn tile(level: u8, pix: u64) -> Self {
        Self {
            level,
            pix,
            allsky: false,
        }
    }

    /// Request the all-sky cell of a level-3 pixel.
    pub fn allsky(pix: u64) -> Self {
        Self {
            level: ALLSKY_LEVEL,
            pix,
            allsky: true,
        }
    }

    /// Get the resolution level.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Get the pixel index.
    pub fn pix(&self) -> u64 {
        self.pix
    }

    pub fn is_allsky(&self) -> bool {
        self.allsky
    }

    /// Checks that the pixel index is in range for its level.
    pub fn validate(&self) -> IndexResult<()> {
        healpix::validate(self.level, self.pix)
    }

    /// Cache key for this request under `source_id`.
    ///
    /// All-sky requests share the composite's key.
    pub fn key(&self, source_id: u64) -> TileKey {
        if self.allsky {
            TileKey::allsky(source_id)
        } else {
            TileKey::new(self.level, self.pix, source_id)
        }
    }
}
