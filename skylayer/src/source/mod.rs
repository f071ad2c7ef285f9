//! Survey source descriptors.
//!
//! A [`SurveySource`] describes one tiled all-sky survey: where its tiles
//! live, how big they are, how deep the hierarchy goes, the image format and
//! the reference frame of its pixel grid. Sources are plain values; the tile
//! manager derives a numeric source id from the base URL to scope its keys.

mod catalog;
mod properties;

pub use catalog::{CatalogRecord, SourceCatalog, NO_SOURCE_TITLE};
pub use properties::parse_properties;

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::healpix::{Frame, MAX_LEVEL};

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_WIDTH: u32 = 512;

/// Default deepest level of a survey.
pub const DEFAULT_MAX_LEVEL: u8 = 9;

/// Errors describing or loading survey sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// None of the advertised tile formats can be decoded.
    #[error("unsupported tile format '{0}' (need jpeg or png)")]
    UnsupportedFormat(String),

    /// A required descriptor field is absent.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A descriptor field could not be parsed.
    #[error("invalid value for '{key}': '{value}'")]
    InvalidValue { key: String, value: String },

    /// Malformed properties text.
    #[error("failed to parse properties: {0}")]
    Properties(#[from] ini::ParseError),

    /// Malformed catalog JSON.
    #[error("failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// Encoded image format of a survey's tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileFormat {
    Jpeg,
    Png,
}

impl TileFormat {
    /// File extension used in tile URLs.
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Jpeg => "jpg",
            TileFormat::Png => "png",
        }
    }

    /// Picks a decodable format from a space-separated format list.
    ///
    /// Surveys advertise lists like `"jpeg fits"`; JPEG is preferred over
    /// PNG, and FITS is never chosen.
    pub fn from_format_list(list: &str) -> Result<Self, SourceError> {
        let lower = list.to_ascii_lowercase();
        let formats: Vec<&str> = lower.split_whitespace().collect();
        if formats.iter().any(|f| *f == "jpeg" || *f == "jpg") {
            Ok(TileFormat::Jpeg)
        } else if formats.contains(&"png") {
            Ok(TileFormat::Png)
        } else {
            Err(SourceError::UnsupportedFormat(list.trim().to_string()))
        }
    }
}

impl FromStr for TileFormat {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_format_list(s)
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileFormat::Jpeg => f.write_str("jpeg"),
            TileFormat::Png => f.write_str("png"),
        }
    }
}

/// Descriptor of one tiled survey.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveySource {
    /// Stable identifier, e.g. `CDS/P/DSS2/color`
    pub id: String,
    /// Human-readable title
    pub title: String,
    pub description: String,
    /// Root URL; tile paths are appended to it
    pub base_url: String,
    /// Tile edge length in pixels
    pub tile_width: u32,
    /// Deepest level with tiles
    pub max_level: u8,
    pub format: TileFormat,
    pub frame: Frame,
    /// Fraction of the sky covered, `0..=1`
    pub sky_fraction: f64,
}

impl SurveySource {
    /// Create a source with default tile width, depth, format and frame.
    ///
    /// # Arguments
    ///
    /// * `title` - Human-readable title (also used as id)
    /// * `base_url` - Root URL of the survey
    pub fn new(title: impl Into<String>, base_url: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: title.clone(),
            title,
            description: String::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tile_width: DEFAULT_TILE_WIDTH,
            max_level: DEFAULT_MAX_LEVEL,
            format: TileFormat::Jpeg,
            frame: Frame::Equatorial,
            sky_fraction: 1.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tile_width(mut self, tile_width: u32) -> Self {
        self.tile_width = tile_width;
        self
    }

    /// Set the deepest level, clamped to the index's maximum.
    pub fn with_max_level(mut self, max_level: u8) -> Self {
        self.max_level = max_level.min(MAX_LEVEL);
        self
    }

    pub fn with_format(mut self, format: TileFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_sky_fraction(mut self, sky_fraction: f64) -> Self {
        self.sky_fraction = sky_fraction.clamp(0.0, 1.0);
        self
    }

    /// Numeric id scoping this survey's tile keys.
    ///
    /// The first 8 bytes (big-endian) of the SHA-256 of the base URL, so two
    /// descriptors pointing at the same tiles share cached entries.
    pub fn source_id(&self) -> u64 {
        let digest = Sha256::digest(self.base_url.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}

impl fmt::Display for SurveySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, order {}, {}px {}, {})",
            self.title, self.base_url, self.max_level, self.tile_width, self.format, self.frame
        )
    }
}
