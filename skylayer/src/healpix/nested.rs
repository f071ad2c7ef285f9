//! Nested-scheme pixel arithmetic.
//!
//! These routines assume their inputs have already been validated by the
//! public API in the parent module: `nside` is a power of two no larger than
//! `2^MAX_LEVEL` and `pix < 12 * nside^2`. Nothing here checks ranges.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use super::tables::{CTAB, FACE_ARRAY, JPLL, JRLL, SWAP_ARRAY, UTAB, X_OFFSET, Y_OFFSET};

const TWO_THIRDS: f64 = 2.0 / 3.0;

/// A pixel expressed as face-local integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FacePixel {
    pub ix: i64,
    pub iy: i64,
    pub face: usize,
}

/// Floating-point modulo that always lands in `[0, v2)`.
fn fmodulo(v1: f64, v2: f64) -> f64 {
    if v1 >= 0.0 {
        return if v1 < v2 { v1 } else { v1 % v2 };
    }
    let tmp = v1 % v2 + v2;
    if tmp == v2 {
        0.0
    } else {
        tmp
    }
}

/// Spreads the low 32 bits of `v` onto the even bit positions of a 64-bit word.
#[inline]
fn spread_bits(v: i64) -> i64 {
    (UTAB[(v & 0xff) as usize] as i64)
        | ((UTAB[((v >> 8) & 0xff) as usize] as i64) << 16)
        | ((UTAB[((v >> 16) & 0xff) as usize] as i64) << 32)
        | ((UTAB[((v >> 24) & 0xff) as usize] as i64) << 48)
}

/// Collects the even bits of `v` into a contiguous 32-bit value.
#[inline]
fn compress_bits(v: i64) -> i64 {
    let mut raw = v & 0x5555_5555_5555_5555;
    raw |= raw >> 15;
    (CTAB[(raw & 0xff) as usize] as i64)
        | ((CTAB[((raw >> 8) & 0xff) as usize] as i64) << 4)
        | ((CTAB[((raw >> 32) & 0xff) as usize] as i64) << 16)
        | ((CTAB[((raw >> 40) & 0xff) as usize] as i64) << 20)
}

pub(crate) fn xyf2nest(nside: i64, ix: i64, iy: i64, face: usize) -> u64 {
    let face_offset = face as i64 * nside * nside;
    (face_offset + spread_bits(ix) + (spread_bits(iy) << 1)) as u64
}

pub(crate) fn nest2xyf(nside: i64, pix: u64) -> FacePixel {
    let npface = nside * nside;
    let pix = pix as i64;
    let face = (pix / npface) as usize;
    let local = pix & (npface - 1);
    FacePixel {
        ix: compress_bits(local),
        iy: compress_bits(local >> 1),
        face,
    }
}

/// Maps `z = sin(dec)` and `phi = ra` (radians) to a nested pixel index.
pub(crate) fn ang2pix_nest_z_phi(nside: i64, z: f64, phi: f64) -> u64 {
    let za = z.abs();
    let tt = fmodulo(phi, TAU) / FRAC_PI_2;
    let nside_f = nside as f64;

    let (ix, iy, face) = if za <= TWO_THIRDS {
        // Equatorial belt
        let temp1 = nside_f * (0.5 + tt);
        let temp2 = nside_f * (z * 0.75);
        let jp = (temp1 - temp2) as i64;
        let jm = (temp1 + temp2) as i64;
        let ifp = jp / nside;
        let ifm = jm / nside;
        let face = if ifp == ifm {
            ifp | 4
        } else if ifp < ifm {
            ifp
        } else {
            ifm + 8
        };
        let ix = jm & (nside - 1);
        let iy = nside - (jp & (nside - 1)) - 1;
        (ix, iy, face)
    } else {
        // Polar caps
        let ntt = (tt as i64).min(3);
        let tp = tt - ntt as f64;
        let tmp = nside_f * (3.0 * (1.0 - za)).sqrt();
        let jp = ((tp * tmp) as i64).min(nside - 1);
        let jm = (((1.0 - tp) * tmp) as i64).min(nside - 1);
        if z >= 0.0 {
            (nside - jm - 1, nside - jp - 1, ntt)
        } else {
            (jp, jm, ntt + 8)
        }
    };

    xyf2nest(nside, ix, iy, face as usize)
}

/// Unit vector of the face-local point `(fx, fy)`, both in `[0, 1]`.
pub(crate) fn face_to_vec(fx: f64, fy: f64, face: usize) -> [f64; 3] {
    let jr = JRLL[face] as f64 - fx - fy;

    let mut sth = None;
    let (nr, z) = if jr < 1.0 {
        let tmp = jr * jr / 3.0;
        let z = 1.0 - tmp;
        if z > 0.99 {
            sth = Some((tmp * (2.0 - tmp)).sqrt());
        }
        (jr, z)
    } else if jr > 3.0 {
        let nr = 4.0 - jr;
        let tmp = nr * nr / 3.0;
        let z = tmp - 1.0;
        if z < -0.99 {
            sth = Some((tmp * (2.0 - tmp)).sqrt());
        }
        (nr, z)
    } else {
        (1.0, (2.0 - jr) * 2.0 / 3.0)
    };

    let mut tmp = JPLL[face] as f64 * nr + fx - fy;
    if tmp < 0.0 {
        tmp += 8.0;
    }
    if tmp >= 8.0 {
        tmp -= 8.0;
    }
    let phi = if nr < 1e-15 {
        0.0
    } else {
        FRAC_PI_4 * tmp / nr
    };

    let st = sth.unwrap_or_else(|| ((1.0 - z) * (1.0 + z)).sqrt());
    [st * phi.cos(), st * phi.sin(), z]
}

/// The four corners of a pixel, ordered `(x+,y+)`, `(x-,y+)`, `(x-,y-)`, `(x+,y-)`.
pub(crate) fn boundaries(nside: i64, pix: u64) -> [[f64; 3]; 4] {
    let fp = nest2xyf(nside, pix);
    let nside_f = nside as f64;
    let dc = 0.5 / nside_f;
    let xc = (fp.ix as f64 + 0.5) / nside_f;
    let yc = (fp.iy as f64 + 0.5) / nside_f;

    [
        face_to_vec(xc + dc, yc + dc, fp.face),
        face_to_vec(xc - dc, yc + dc, fp.face),
        face_to_vec(xc - dc, yc - dc, fp.face),
        face_to_vec(xc + dc, yc - dc, fp.face),
    ]
}

/// Lattice of `(steps + 1)^2` points spanning a pixel.
///
/// Rows advance along face-local x and columns along face-local y, so that
/// row `r`, column `c` sits at texture coordinate `(c / steps, r / steps)`
/// under the corner ordering of [`boundaries`].
pub(crate) fn lattice(nside: i64, pix: u64, steps: u32) -> Vec<[f64; 3]> {
    let fp = nest2xyf(nside, pix);
    let nside_f = nside as f64;
    let steps_f = steps as f64;
    let side = steps as usize + 1;

    let mut points = Vec::with_capacity(side * side);
    for r in 0..=steps {
        let fx = (fp.ix as f64 + r as f64 / steps_f) / nside_f;
        for c in 0..=steps {
            let fy = (fp.iy as f64 + c as f64 / steps_f) / nside_f;
            points.push(face_to_vec(fx, fy, fp.face));
        }
    }
    points
}

pub(crate) fn center(nside: i64, pix: u64) -> [f64; 3] {
    let fp = nest2xyf(nside, pix);
    let nside_f = nside as f64;
    face_to_vec(
        (fp.ix as f64 + 0.5) / nside_f,
        (fp.iy as f64 + 0.5) / nside_f,
        fp.face,
    )
}

/// Neighbours in the order SW, W, NW, N, NE, E, SE, S.
pub(crate) fn neighbours(nside: i64, pix: u64) -> [Option<u64>; 8] {
    let FacePixel { ix, iy, face } = nest2xyf(nside, pix);
    let nsm1 = nside - 1;

    if ix > 0 && ix < nsm1 && iy > 0 && iy < nsm1 {
        let fpix = face as i64 * nside * nside;
        let px0 = spread_bits(ix);
        let py0 = spread_bits(iy) << 1;
        let pxp = spread_bits(ix + 1);
        let pyp = spread_bits(iy + 1) << 1;
        let pxm = spread_bits(ix - 1);
        let pym = spread_bits(iy - 1) << 1;

        return [
            fpix + pxm + py0,
            fpix + pxm + pyp,
            fpix + px0 + pyp,
            fpix + pxp + pyp,
            fpix + pxp + py0,
            fpix + pxp + pym,
            fpix + px0 + pym,
            fpix + pxm + pym,
        ]
        .map(|p| Some(p as u64));
    }

    let mut result = [None; 8];
    for (dir, slot) in result.iter_mut().enumerate() {
        let mut x = ix + X_OFFSET[dir];
        let mut y = iy + Y_OFFSET[dir];
        let mut nbnum = 4usize;

        if x < 0 {
            x += nside;
            nbnum -= 1;
        } else if x >= nside {
            x -= nside;
            nbnum += 1;
        }
        if y < 0 {
            y += nside;
            nbnum -= 3;
        } else if y >= nside {
            y -= nside;
            nbnum += 3;
        }

        let target = FACE_ARRAY[nbnum][face];
        if target < 0 {
            continue;
        }

        let bits = SWAP_ARRAY[nbnum][face >> 2];
        if bits & 1 != 0 {
            x = nside - x - 1;
        }
        if bits & 2 != 0 {
            y = nside - y - 1;
        }
        if bits & 4 != 0 {
            std::mem::swap(&mut x, &mut y);
        }
        *slot = Some(xyf2nest(nside, x, y, target as usize));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmodulo_wraps_negative_values() {
        assert!((fmodulo(-1.0, TAU) - (TAU - 1.0)).abs() < 1e-12);
        assert_eq!(fmodulo(-TAU, TAU), 0.0);
        assert!((fmodulo(TAU + 0.5, TAU) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_xyf_roundtrip_high_order() {
        let nside = 1i64 << 29;
        let ix = nside - 3;
        let iy = 0x1234_5678 & (nside - 1);
        let pix = xyf2nest(nside, ix, iy, 11);
        assert_eq!(nest2xyf(nside, pix), FacePixel { ix, iy, face: 11 });
    }

    #[test]
    fn test_equator_origin_is_face_four() {
        assert_eq!(ang2pix_nest_z_phi(1, 0.0, 0.0), 4);
    }

    #[test]
    fn test_poles_at_order_one() {
        assert_eq!(ang2pix_nest_z_phi(2, 1.0, 0.0), 3);
        assert_eq!(ang2pix_nest_z_phi(2, -1.0, 0.0), 32);
    }

    #[test]
    fn test_interior_neighbours() {
        // ix = 1, iy = 1 on face 0 at nside 4
        let got = neighbours(4, 3);
        let expected = [2, 8, 9, 12, 6, 4, 1, 0].map(Some);
        assert_eq!(got, expected);
    }

    #[test]
    fn test_face_corner_lacks_one_neighbour() {
        // ix = 0, iy = 1 on face 0 at nside 2 touches a corner shared by three faces
        let got = neighbours(2, 2);
        assert_eq!(got.iter().filter(|n| n.is_none()).count(), 1);
    }

    #[test]
    fn test_face_corners_on_unit_sphere() {
        for pix in 0..48 {
            for v in boundaries(2, pix) {
                let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
                assert!((norm - 1.0).abs() < 1e-12, "pix {} corner not unit", pix);
            }
        }
    }

    #[test]
    fn test_lattice_corners_match_boundaries() {
        let pts = lattice(8, 77, 3);
        let b = boundaries(8, 77);
        // (x-,y-) is row 0 col 0, (x+,y+) is the last point
        assert_eq!(pts[0], b[2]);
        assert_eq!(pts[15], b[0]);
    }
}
