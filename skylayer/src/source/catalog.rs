//! Catalog of known surveys.
//!
//! Catalog files are JSON arrays of records whose keys follow the HiPS
//! property names. A built-in catalog with a few well-known colour surveys is
//! available when no file is configured.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{SourceError, SurveySource, TileFormat};
use crate::healpix::Frame;

/// Title that selects no survey at all.
pub const NO_SOURCE_TITLE: &str = "None";

/// One catalog entry as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(rename = "ID")]
    pub id: String,
    pub obs_title: String,
    #[serde(default)]
    pub obs_description: String,
    pub hips_order: String,
    #[serde(default = "default_frame")]
    pub hips_frame: String,
    #[serde(default = "default_tile_width")]
    pub hips_tile_width: String,
    pub hips_tile_format: String,
    pub hips_service_url: String,
    #[serde(default = "default_sky_fraction")]
    pub moc_sky_fraction: String,
}

fn default_frame() -> String {
    "equatorial".to_string()
}

fn default_tile_width() -> String {
    "512".to_string()
}

fn default_sky_fraction() -> String {
    "1".to_string()
}

impl TryFrom<&CatalogRecord> for SurveySource {
    type Error = SourceError;

    fn try_from(record: &CatalogRecord) -> Result<Self, Self::Error> {
        let invalid = |key: &str, value: &str| SourceError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        let max_level: u8 = record
            .hips_order
            .trim()
            .parse()
            .map_err(|_| invalid("hips_order", &record.hips_order))?;
        let tile_width: u32 = record
            .hips_tile_width
            .trim()
            .parse()
            .map_err(|_| invalid("hips_tile_width", &record.hips_tile_width))?;
        let sky_fraction: f64 = record
            .moc_sky_fraction
            .trim()
            .parse()
            .map_err(|_| invalid("moc_sky_fraction", &record.moc_sky_fraction))?;
        let format = TileFormat::from_format_list(&record.hips_tile_format)?;
        let frame: Frame = record.hips_frame.parse().unwrap_or_default();

        Ok(SurveySource::new(record.obs_title.clone(), record.hips_service_url.clone())
            .with_id(record.id.clone())
            .with_description(record.obs_description.clone())
            .with_max_level(max_level)
            .with_tile_width(tile_width)
            .with_format(format)
            .with_frame(frame)
            .with_sky_fraction(sky_fraction))
    }
}

/// An ordered list of surveys addressable by id or title.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: Vec<SurveySource>,
}

impl SourceCatalog {
    pub fn new(sources: Vec<SurveySource>) -> Self {
        Self { sources }
    }

    /// Well-known colour surveys hosted by CDS.
    pub fn builtin() -> Self {
        let sources = vec![
            SurveySource::new("DSS Colored", "http://alasky.u-strasbg.fr/DSS/DSSColor")
                .with_id("CDS/P/DSS2/color")
                .with_description("Color composition of the DSS2-red and DSS2-blue surveys")
                .with_max_level(9),
            SurveySource::new(
                "2MASS Color J (1.23 microns), H (1.66 microns), K (2.16 microns)",
                "http://alaskybis.u-strasbg.fr/2MASS/Color",
            )
            .with_id("CDS/P/2MASS/color")
            .with_description("Near-infrared colour composition of the 2MASS survey")
            .with_max_level(9),
            SurveySource::new(
                "Fermi Color HEALPix Survey",
                "http://alaskybis.u-strasbg.fr/Fermi/Color",
            )
            .with_id("CDS/P/Fermi/color")
            .with_description("Fermi gamma-ray intensity maps in colour")
            .with_max_level(3),
        ];
        Self { sources }
    }

    /// Parse a JSON array of [`CatalogRecord`]s.
    ///
    /// Records that fail to convert are logged and skipped.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let records: Vec<CatalogRecord> = serde_json::from_str(json)?;
        let mut sources = Vec::with_capacity(records.len());
        for record in &records {
            match SurveySource::try_from(record) {
                Ok(source) => sources.push(source),
                Err(e) => warn!(id = %record.id, error = %e, "Skipping catalog entry"),
            }
        }
        debug!(count = sources.len(), "Loaded survey catalog");
        Ok(Self { sources })
    }

    /// Load a catalog file.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Find a survey by id or title.
    ///
    /// Returns `None` for unknown names and for [`NO_SOURCE_TITLE`].
    pub fn find(&self, name: &str) -> Option<&SurveySource> {
        if name == NO_SOURCE_TITLE {
            return None;
        }
        self.sources
            .iter()
            .find(|s| s.id == name)
            .or_else(|| self.sources.iter().find(|s| s.title == name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SurveySource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
