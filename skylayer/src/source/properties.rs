//! HiPS `properties` file parsing.
//!
//! Every survey publishes a `{base_url}/properties` file of `key = value`
//! lines. This module turns one into a [`SurveySource`].

use ini::{Ini, ParseOption};

use super::{SourceError, SurveySource, TileFormat, DEFAULT_TILE_WIDTH};
use crate::healpix::Frame;

/// Parse a survey's `properties` text.
///
/// `base_url` is where the file was fetched from; `hips_service_url`
/// overrides it when present.
///
/// # Errors
///
/// Fails when the title or `hips_order` is missing, when a numeric field does
/// not parse, or when no decodable tile format is advertised.
pub fn parse_properties(text: &str, base_url: &str) -> Result<SurveySource, SourceError> {
    let option = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(text, option)?;
    let props = ini.general_section();
    let get = |key: &str| props.get(key).map(str::trim).filter(|v| !v.is_empty());

    let title = get("obs_title")
        .or_else(|| get("obs_collection"))
        .ok_or(SourceError::MissingField("obs_title"))?;

    let max_level = get("hips_order").ok_or(SourceError::MissingField("hips_order"))?;
    let max_level: u8 = parse_field("hips_order", max_level)?;

    let tile_width = match get("hips_tile_width") {
        Some(v) => parse_field("hips_tile_width", v)?,
        None => DEFAULT_TILE_WIDTH,
    };

    let format = TileFormat::from_format_list(get("hips_tile_format").unwrap_or("jpeg"))?;

    let frame: Frame = get("hips_frame")
        .or_else(|| get("ohips_frame"))
        .unwrap_or("equatorial")
        .parse()
        .unwrap_or_default();

    let sky_fraction = match get("moc_sky_fraction") {
        Some(v) => parse_field("moc_sky_fraction", v)?,
        None => 1.0,
    };

    let base_url = get("hips_service_url").unwrap_or(base_url);
    let mut source = SurveySource::new(title, base_url)
        .with_max_level(max_level)
        .with_tile_width(tile_width)
        .with_format(format)
        .with_frame(frame)
        .with_sky_fraction(sky_fraction);

    if let Some(id) = get("creator_did").or_else(|| get("publisher_did")) {
        source = source.with_id(id.trim_start_matches("ivo://"));
    }
    if let Some(description) = get("obs_description") {
        source = source.with_description(description);
    }
    Ok(source)
}

fn parse_field<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SourceError> {
    value.parse().map_err(|_| SourceError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
