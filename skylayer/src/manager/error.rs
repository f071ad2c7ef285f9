//! Tile decoding.

use thiserror::Error;

use crate::tile::TileImage;

/// Why downloaded bytes could not become a tile.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Bytes are not a readable PNG or JPEG.
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// Image decoded but is not the survey's tile size.
    #[error("unexpected tile size {width}x{height}, expected {expected}x{expected}")]
    UnexpectedSize {
        width: u32,
        height: u32,
        expected: u32,
    },
}

/// Decode tile bytes to RGBA.
///
/// When `expected_width` is given the image must be exactly that square.
pub fn decode_tile(bytes: &[u8], expected_width: Option<u32>) -> Result<TileImage, DecodeError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    if let Some(expected) = expected_width {
        let (width, height) = image.dimensions();
        if width != expected || height != expected {
            return Err(DecodeError::UnexpectedSize {
                width,
                height,
                expected,
            });
        }
    }
    Ok(image)
}

/// Encode an image as PNG bytes.
#[cfg(test)]
pub fn encode_png(image: &TileImage) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
