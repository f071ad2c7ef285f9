//! Tile identity, requests and decoded tile images.
//!
//! A [`TileKey`] identifies one tile of one survey. Keys are scoped by a
//! source id derived from the survey's base URL, so tiles of different
//! surveys never collide in the cache or in the pending set.

mod crop;
mod path;
mod request;

pub use crop::{crop_allsky_cell, crop_quadrant, ALLSKY_CELL_SIZE, ALLSKY_LEVEL};
pub use path::{allsky_url, tile_url};
pub use request::TileRequest;

use std::fmt;

/// A decoded tile: 8-bit RGBA, row-major.
pub type TileImage = image::RgbaImage;

/// Bytes per pixel of a decoded [`TileImage`].
pub const BYTES_PER_PIXEL: usize = 4;

/// Synthetic pixel number of the all-sky composite.
pub const ALLSKY_PIX: u64 = u64::MAX;

/// Memory cost of a decoded tile in bytes.
#[inline]
pub fn image_cost(image: &TileImage) -> usize {
    image.as_raw().len()
}

/// Identity of one tile of one survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub level: u8,
    pub pix: u64,
    pub source_id: u64,
}

impl TileKey {
    pub fn new(level: u8, pix: u64, source_id: u64) -> Self {
        Self {
            level,
            pix,
            source_id,
        }
    }

    /// Key of a survey's all-sky composite.
    pub fn allsky(source_id: u64) -> Self {
        Self {
            level: 0,
            pix: ALLSKY_PIX,
            source_id,
        }
    }

    pub fn is_allsky(&self) -> bool {
        self.level == 0 && self.pix == ALLSKY_PIX
    }

    /// Key of the tile one level up that covers this one.
    ///
    /// Returns `None` at level 0 and for the all-sky composite.
    pub fn parent(&self) -> Option<TileKey> {
        if self.level == 0 || self.is_allsky() {
            return None;
        }
        Some(Self {
            level: self.level - 1,
            pix: crate::healpix::parent(self.pix),
            source_id: self.source_id,
        })
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_allsky() {
            write!(f, "tile:{:016x}:allsky", self.source_id)
        } else {
            write!(f, "tile:{:016x}:{}:{}", self.source_id, self.level, self.pix)
        }
    }
}
