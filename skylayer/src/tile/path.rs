//! Survey URL layout.
//!
//! Tiles are sharded into directories of 10000 pixels:
//! `{base}/Norder{level}/Dir{(pix / 10000) * 10000}/Npix{pix}.{ext}`.
//! The all-sky composite lives at `{base}/Norder3/Allsky.{ext}`.

use crate::source::TileFormat;

use super::ALLSKY_LEVEL;

const DIR_SHARD: u64 = 10_000;

/// URL of one tile.
pub fn tile_url(base_url: &str, level: u8, pix: u64, format: TileFormat) -> String {
    format!(
        "{}/Norder{}/Dir{}/Npix{}.{}",
        base_url.trim_end_matches('/'),
        level,
        (pix / DIR_SHARD) * DIR_SHARD,
        pix,
        format.extension()
    )
}

/// URL of a survey's all-sky composite.
pub fn allsky_url(base_url: &str, format: TileFormat) -> String {
    format!(
        "{}/Norder{}/Allsky.{}",
        base_url.trim_end_matches('/'),
        ALLSKY_LEVEL,
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_sharding() {
        assert_eq!(
            tile_url("http://example.org/DSS", 9, 123_456, TileFormat::Jpeg),
            "http://example.org/DSS/Norder9/Dir120000/Npix123456.jpg"
        );
        assert_eq!(
            tile_url("http://example.org/DSS/", 3, 0, TileFormat::Png),
            "http://example.org/DSS/Norder3/Dir0/Npix0.png"
        );
    }

    #[test]
    fn test_tile_url_shard_boundary() {
        let url = tile_url("http://h", 8, 9_999, TileFormat::Png);
        assert!(url.ends_with("/Dir0/Npix9999.png"));
        let url = tile_url("http://h", 8, 10_000, TileFormat::Png);
        assert!(url.ends_with("/Dir10000/Npix10000.png"));
    }

    #[test]
    fn test_allsky_url() {
        assert_eq!(
            allsky_url("http://example.org/2MASS", TileFormat::Jpeg),
            "http://example.org/2MASS/Norder3/Allsky.jpg"
        );
    }
}
