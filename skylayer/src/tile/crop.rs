//! Sub-images derived from cached tiles.
//!
//! Both helpers return an independently owned copy; the cached tile is only
//! borrowed for the duration of the copy.

use image::imageops;

use super::TileImage;

/// Edge length of one cell of the all-sky composite.
pub const ALLSKY_CELL_SIZE: u32 = 64;

/// Level whose pixels are packed into the all-sky composite.
pub const ALLSKY_LEVEL: u8 = 3;

/// Cuts the cell for level-3 pixel `pix` out of an all-sky composite.
///
/// Cells are laid out row-major, `width / 64` per row. Returns `None` when
/// the composite is too small to hold the requested cell.
pub fn crop_allsky_cell(allsky: &TileImage, pix: u64) -> Option<TileImage> {
    let per_row = (allsky.width() / ALLSKY_CELL_SIZE) as u64;
    if per_row == 0 {
        return None;
    }
    let x = (pix % per_row) * ALLSKY_CELL_SIZE as u64;
    let y = (pix / per_row) * ALLSKY_CELL_SIZE as u64;
    if y + ALLSKY_CELL_SIZE as u64 > allsky.height() as u64 {
        return None;
    }
    Some(
        imageops::crop_imm(
            allsky,
            x as u32,
            y as u32,
            ALLSKY_CELL_SIZE,
            ALLSKY_CELL_SIZE,
        )
        .to_image(),
    )
}

/// Cuts the quadrant of `parent` covered by child pixel `child_pix`.
///
/// The low bit of the child's nested index selects the row half, the next
/// bit the column half.
pub fn crop_quadrant(parent: &TileImage, child_pix: u64) -> Option<TileImage> {
    const QUADRANT: [u32; 4] = [0, 2, 1, 3];

    let size = parent.width() / 2;
    if size == 0 || parent.height() < size * 2 {
        return None;
    }
    let index = QUADRANT[(child_pix % 4) as usize];
    let ox = index % 2;
    let oy = index / 2;
    Some(imageops::crop_imm(parent, ox * size, oy * size, size, size).to_image())
}
