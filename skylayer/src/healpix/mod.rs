//! Hierarchical equal-area sky indexing (HEALPix nested scheme).
//!
//! Converts between sky coordinates and nested pixel indices, and computes
//! pixel corners, neighbours and children. A level-`L` tessellation has
//! `nside = 2^L` and `12 * nside^2` pixels; the four children of pixel `p`
//! at level `L + 1` are `4p .. 4p + 3`.
//!
//! # Example
//!
//! ```ignore
//! use skylayer::healpix::{self, SkyPoint};
//!
//! let vega = SkyPoint::from_degrees(279.2347, 38.7837);
//! let pix = healpix::index(6, vega.ra, vega.dec)?;
//! let quad = healpix::corners(6, pix)?;
//! ```
//!
//! All inputs are validated here; the arithmetic in the private submodules
//! assumes in-range values.

mod nested;
mod tables;
mod types;

pub use types::{Frame, IndexError, IndexResult, SkyPoint, MAX_LEVEL};

/// Number of neighbour directions returned by [`neighbours`].
pub const NEIGHBOUR_COUNT: usize = 8;

/// `nside` for a level.
pub fn nside(level: u8) -> IndexResult<u64> {
    if level > MAX_LEVEL {
        return Err(IndexError::InvalidLevel { level });
    }
    Ok(1u64 << level)
}

/// Total number of pixels at a level.
pub fn pixel_count(level: u8) -> IndexResult<u64> {
    let n = nside(level)?;
    Ok(12 * n * n)
}

/// Checks that `pix` is a valid index at `level`.
pub fn validate(level: u8, pix: u64) -> IndexResult<()> {
    if pix >= pixel_count(level)? {
        return Err(IndexError::InvalidIndex { level, pix });
    }
    Ok(())
}

/// Maps an equatorial coordinate (radians) to its pixel at `level`.
///
/// # Arguments
///
/// * `level` - Resolution level, at most [`MAX_LEVEL`]
/// * `ra` - Right ascension in radians (any value; wrapped)
/// * `dec` - Declination in radians
///
/// # Returns
///
/// The nested pixel index in `[0, 12 * 4^level)`.
pub fn index(level: u8, ra: f64, dec: f64) -> IndexResult<u64> {
    let n = nside(level)? as i64;
    Ok(nested::ang2pix_nest_z_phi(n, dec.sin(), ra))
}

/// Maps an equatorial point to its pixel in a survey laid out in `frame`.
///
/// For galactic surveys the point is rotated into galactic coordinates
/// before indexing.
pub fn index_in_frame(frame: Frame, level: u8, point: &SkyPoint) -> IndexResult<u64> {
    match frame {
        Frame::Galactic => {
            let native = SkyPoint::from_vector(frame.from_equatorial(point.to_vector()));
            index(level, native.ra, native.dec)
        }
        Frame::Equatorial | Frame::Other => index(level, point.ra, point.dec),
    }
}

/// The pixel's four corners on the sphere, in the index's native frame.
///
/// Corner `k` corresponds to tile texture coordinate
/// `[(1,1), (1,0), (0,0), (0,1)][k]`.
pub fn corners(level: u8, pix: u64) -> IndexResult<[SkyPoint; 4]> {
    corners_in_frame(Frame::Equatorial, level, pix)
}

/// The pixel's four corners, rotated from `frame` back to equatorial.
pub fn corners_in_frame(frame: Frame, level: u8, pix: u64) -> IndexResult<[SkyPoint; 4]> {
    validate(level, pix)?;
    let n = 1i64 << level;
    Ok(nested::boundaries(n, pix).map(|v| SkyPoint::from_vector(frame.to_equatorial(v))))
}

/// A `(steps + 1) x (steps + 1)` lattice of sky points over the pixel.
///
/// Points are row-major; row `r`, column `c` has texture coordinate
/// `(c / steps, r / steps)`, consistent with [`corners`]. `steps` of zero is
/// treated as one.
pub fn corner_grid(frame: Frame, level: u8, pix: u64, steps: u32) -> IndexResult<Vec<SkyPoint>> {
    validate(level, pix)?;
    let n = 1i64 << level;
    Ok(nested::lattice(n, pix, steps.max(1))
        .into_iter()
        .map(|v| SkyPoint::from_vector(frame.to_equatorial(v)))
        .collect())
}

/// Centre of a pixel, rotated from `frame` back to equatorial.
pub fn center(frame: Frame, level: u8, pix: u64) -> IndexResult<SkyPoint> {
    validate(level, pix)?;
    let n = 1i64 << level;
    Ok(SkyPoint::from_vector(frame.to_equatorial(nested::center(n, pix))))
}

/// The 8 neighbours of `pix`, ordered SW, W, NW, N, NE, E, SE, S.
///
/// A direction with no neighbouring pixel (a handful of pixels next to the
/// corners where only three base faces meet) is `None`.
///
/// # Arguments
///
/// * `nside` - Power of two up to `2^MAX_LEVEL`
/// * `pix` - Pixel index in `[0, 12 * nside^2)`
pub fn neighbours(nside: u64, pix: u64) -> IndexResult<[Option<u64>; NEIGHBOUR_COUNT]> {
    if !nside.is_power_of_two() || nside > (1u64 << MAX_LEVEL) {
        return Err(IndexError::InvalidNside { nside });
    }
    let level = nside.trailing_zeros() as u8;
    validate(level, pix)?;
    Ok(nested::neighbours(nside as i64, pix))
}

/// The four children of `pix` at `level + 1`.
pub fn children(level: u8, pix: u64) -> IndexResult<[u64; 4]> {
    validate(level, pix)?;
    if level >= MAX_LEVEL {
        return Err(IndexError::InvalidLevel { level: level + 1 });
    }
    let first = pix * 4;
    Ok([first, first + 1, first + 2, first + 3])
}

/// The pixel one level up that contains `pix`.
#[inline]
pub fn parent(pix: u64) -> u64 {
    pix / 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::f64::consts::FRAC_PI_2;

    fn centroid(points: &[SkyPoint]) -> SkyPoint {
        let mut sum = [0.0; 3];
        for p in points {
            let v = p.to_vector();
            sum[0] += v[0];
            sum[1] += v[1];
            sum[2] += v[2];
        }
        SkyPoint::from_vector(sum)
    }

    #[test]
    fn test_pixel_count() {
        assert_eq!(pixel_count(0).unwrap(), 12);
        assert_eq!(pixel_count(3).unwrap(), 768);
        assert_eq!(pixel_count(29).unwrap(), 12 * (1u64 << 58));
    }

    #[test]
    fn test_level_too_deep() {
        assert!(matches!(
            index(30, 0.0, 0.0),
            Err(IndexError::InvalidLevel { level: 30 })
        ));
    }

    #[test]
    fn test_corners_rejects_out_of_range_pixel() {
        let result = corners(1, 48);
        assert_eq!(result, Err(IndexError::InvalidIndex { level: 1, pix: 48 }));
    }

    #[test]
    fn test_north_pole() {
        assert_eq!(index(0, 0.0, FRAC_PI_2).unwrap(), 0);
        assert_eq!(index(1, 0.0, FRAC_PI_2).unwrap(), 3);
    }

    #[test]
    fn test_children_and_parent() {
        assert_eq!(children(2, 5).unwrap(), [20, 21, 22, 23]);
        for child in children(2, 5).unwrap() {
            assert_eq!(parent(child), 5);
        }
        assert!(children(MAX_LEVEL, 0).is_err());
    }

    #[test]
    fn test_child_contains_point_of_parent() {
        let p = SkyPoint::from_degrees(83.82, -5.39);
        let coarse = index(4, p.ra, p.dec).unwrap();
        let fine = index(5, p.ra, p.dec).unwrap();
        assert_eq!(parent(fine), coarse);
    }

    #[test]
    fn test_neighbours_rejects_bad_nside() {
        assert!(matches!(
            neighbours(3, 0),
            Err(IndexError::InvalidNside { nside: 3 })
        ));
        assert!(neighbours(4, 12 * 16).is_err());
    }

    #[test]
    fn test_neighbour_relation_is_symmetric() {
        for level in 0..4u8 {
            let nside = 1u64 << level;
            for pix in 0..pixel_count(level).unwrap() {
                for q in neighbours(nside, pix).unwrap().into_iter().flatten() {
                    let back: HashSet<_> =
                        neighbours(nside, q).unwrap().into_iter().flatten().collect();
                    assert!(
                        back.contains(&pix),
                        "level {}: {} lists {} but not vice versa",
                        level,
                        pix,
                        q
                    );
                }
            }
        }
    }

    #[test]
    fn test_neighbours_are_distinct_and_exclude_self() {
        let nside = 8;
        for pix in 0..pixel_count(3).unwrap() {
            let list: Vec<u64> = neighbours(nside, pix).unwrap().into_iter().flatten().collect();
            let unique: HashSet<_> = list.iter().copied().collect();
            assert_eq!(unique.len(), list.len(), "duplicate neighbour of {}", pix);
            assert!(!unique.contains(&pix));
            assert!(list.len() >= 7);
        }
    }

    #[test]
    fn test_center_reindexes_in_galactic_frame() {
        for pix in 0..192 {
            let c = center(Frame::Galactic, 2, pix).unwrap();
            assert_eq!(index_in_frame(Frame::Galactic, 2, &c).unwrap(), pix);
        }
    }

    #[test]
    fn test_corner_grid_matches_corners() {
        let grid = corner_grid(Frame::Equatorial, 5, 1234, 2).unwrap();
        let quad = corners(5, 1234).unwrap();
        assert_eq!(grid.len(), 9);
        // uv (0,0) is corner 2 and uv (1,1) corner 0
        assert!(grid[0].separation(&quad[2]) < 1e-12);
        assert!(grid[8].separation(&quad[0]) < 1e-12);
        // uv (1,0) is corner 1: row 0, last column
        assert!(grid[2].separation(&quad[1]) < 1e-12);
    }

    #[test]
    fn test_every_pixel_centroid_roundtrip_low_levels() {
        for level in 0..4u8 {
            for pix in 0..pixel_count(level).unwrap() {
                let c = centroid(&corners(level, pix).unwrap());
                assert_eq!(index(level, c.ra, c.dec).unwrap(), pix);
            }
        }
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_index_in_range(
                level in 0u8..=MAX_LEVEL,
                ra in 0.0..360.0_f64,
                dec in -90.0..=90.0_f64,
            ) {
                let p = SkyPoint::from_degrees(ra, dec);
                let pix = index(level, p.ra, p.dec).unwrap();
                prop_assert!(
                    pix < pixel_count(level).unwrap(),
                    "pix {} out of range at level {}",
                    pix, level
                );
            }

            #[test]
            fn test_centroid_roundtrip(
                level in 0u8..=16,
                ra in 0.0..360.0_f64,
                dec in -89.9..89.9_f64,
            ) {
                let p = SkyPoint::from_degrees(ra, dec);
                let pix = index(level, p.ra, p.dec).unwrap();
                let c = centroid(&corners(level, pix).unwrap());
                prop_assert_eq!(index(level, c.ra, c.dec).unwrap(), pix);
            }

            #[test]
            fn test_neighbours_in_range(level in 0u8..=12, seed in any::<u64>()) {
                let nside = 1u64 << level;
                let pix = seed % pixel_count(level).unwrap();
                let result = neighbours(nside, pix).unwrap();
                prop_assert_eq!(result.len(), NEIGHBOUR_COUNT);
                for q in result.into_iter().flatten() {
                    prop_assert!(q < pixel_count(level).unwrap());
                }
            }

            #[test]
            fn test_interior_direction_symmetry(
                level in 2u8..=20,
                face in 0u64..12,
                fx in 0.0..1.0_f64,
                fy in 0.0..1.0_f64,
            ) {
                let nside = 1u64 << level;
                let ix = 1 + ((nside - 2) as f64 * fx) as u64 % (nside - 2);
                let iy = 1 + ((nside - 2) as f64 * fy) as u64 % (nside - 2);
                let pix = nested::xyf2nest(nside as i64, ix as i64, iy as i64, face as usize);
                let around = neighbours(nside, pix).unwrap();
                for (k, q) in around.iter().enumerate() {
                    let q = q.expect("interior pixels have all neighbours");
                    let back = neighbours(nside, q).unwrap();
                    prop_assert_eq!(back[(k + 4) % 8], Some(pix));
                }
            }
        }
    }
}
