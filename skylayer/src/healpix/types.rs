//! Value types shared by the spatial index API.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Deepest supported resolution level (`nside = 2^29`).
pub const MAX_LEVEL: u8 = 29;

/// Errors raised at the spatial index API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Level deeper than [`MAX_LEVEL`].
    #[error("invalid level {level}: must be at most {MAX_LEVEL}")]
    InvalidLevel { level: u8 },

    /// Pixel index outside `[0, 12 * 4^level)`.
    #[error("invalid pixel {pix} at level {level}")]
    InvalidIndex { level: u8, pix: u64 },

    /// `nside` that is not a supported power of two.
    #[error("invalid nside {nside}: must be a power of two up to 2^{MAX_LEVEL}")]
    InvalidNside { nside: u64 },
}

/// Result type for spatial index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// A direction on the celestial sphere, in radians.
///
/// `ra` is normalised to `[0, 2pi)` when derived from a vector; `dec` lies in
/// `[-pi/2, pi/2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPoint {
    pub ra: f64,
    pub dec: f64,
}

impl SkyPoint {
    /// Creates a point from right ascension and declination in radians.
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    /// Creates a point from right ascension and declination in degrees.
    pub fn from_degrees(ra: f64, dec: f64) -> Self {
        Self {
            ra: ra.to_radians(),
            dec: dec.to_radians(),
        }
    }

    pub fn ra_degrees(&self) -> f64 {
        self.ra.to_degrees()
    }

    pub fn dec_degrees(&self) -> f64 {
        self.dec.to_degrees()
    }

    /// Cartesian unit vector for this direction.
    pub fn to_vector(&self) -> [f64; 3] {
        let cos_dec = self.dec.cos();
        [
            cos_dec * self.ra.cos(),
            cos_dec * self.ra.sin(),
            self.dec.sin(),
        ]
    }

    /// Direction of a (not necessarily normalised) Cartesian vector.
    pub fn from_vector(v: [f64; 3]) -> Self {
        let [x, y, z] = v;
        let mut ra = y.atan2(x);
        if ra < 0.0 {
            ra += TAU;
        }
        let dec = z.atan2((x * x + y * y).sqrt());
        Self { ra, dec }
    }

    /// Angular separation in radians.
    pub fn separation(&self, other: &SkyPoint) -> f64 {
        let a = self.to_vector();
        let b = other.to_vector();
        let cross = [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ];
        let sin = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
        let cos = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
        sin.atan2(cos)
    }
}

impl fmt::Display for SkyPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}°, {:+.6}°)", self.ra_degrees(), self.dec_degrees())
    }
}

/// Reference frame in which a survey's pixels are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Frame {
    /// ICRS / J2000 equatorial; the index's native frame.
    #[default]
    Equatorial,
    /// Galactic coordinates.
    Galactic,
    /// Any other frame; indexed as if equatorial.
    Other,
}

/// J2000 equatorial to galactic rotation (row-major).
const EQUATORIAL_TO_GALACTIC: [[f64; 3]; 3] = [
    [-0.0548762, -0.873437, -0.483835],
    [0.4941100, -0.444830, 0.746982],
    [-0.8676660, -0.198076, 0.455984],
];

impl Frame {
    /// Rotates an equatorial vector into this frame.
    pub fn from_equatorial(&self, v: [f64; 3]) -> [f64; 3] {
        match self {
            Frame::Galactic => {
                let m = &EQUATORIAL_TO_GALACTIC;
                [
                    m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
                    m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
                    m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
                ]
            }
            Frame::Equatorial | Frame::Other => v,
        }
    }

    /// Rotates a vector in this frame back to equatorial (transpose rotation).
    pub fn to_equatorial(&self, v: [f64; 3]) -> [f64; 3] {
        match self {
            Frame::Galactic => {
                let m = &EQUATORIAL_TO_GALACTIC;
                [
                    m[0][0] * v[0] + m[1][0] * v[1] + m[2][0] * v[2],
                    m[0][1] * v[0] + m[1][1] * v[1] + m[2][1] * v[2],
                    m[0][2] * v[0] + m[1][2] * v[1] + m[2][2] * v[2],
                ]
            }
            Frame::Equatorial | Frame::Other => v,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frame::Equatorial => "equatorial",
            Frame::Galactic => "galactic",
            Frame::Other => "other",
        }
    }
}

impl FromStr for Frame {
    type Err = std::convert::Infallible;

    /// Unknown frame names map to [`Frame::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "equatorial" | "icrs" | "fk5" | "j2000" | "c" => Frame::Equatorial,
            "galactic" | "g" => Frame::Galactic,
            _ => Frame::Other,
        })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_roundtrip() {
        let p = SkyPoint::from_degrees(123.4, -56.7);
        let back = SkyPoint::from_vector(p.to_vector());
        assert!((back.ra - p.ra).abs() < 1e-12);
        assert!((back.dec - p.dec).abs() < 1e-12);
    }

    #[test]
    fn test_from_vector_normalises_ra() {
        let p = SkyPoint::from_vector([1.0, -1.0, 0.0]);
        assert!((p.ra_degrees() - 315.0).abs() < 1e-9);
    }

    #[test]
    fn test_galactic_centre() {
        // Galactic centre sits near RA 266.405, Dec -28.936 (J2000)
        let gc = SkyPoint::from_degrees(266.405, -28.936);
        let gal = SkyPoint::from_vector(Frame::Galactic.from_equatorial(gc.to_vector()));
        let l = gal.ra_degrees();
        let l = if l > 180.0 { l - 360.0 } else { l };
        assert!(l.abs() < 0.01, "galactic longitude {} should be ~0", l);
        assert!(gal.dec_degrees().abs() < 0.01);
    }

    #[test]
    fn test_galactic_rotation_inverts() {
        let p = SkyPoint::from_degrees(10.0, 41.0);
        let v = Frame::Galactic.to_equatorial(Frame::Galactic.from_equatorial(p.to_vector()));
        let back = SkyPoint::from_vector(v);
        assert!(back.separation(&p) < 1e-5);
    }

    #[test]
    fn test_frame_parse() {
        assert_eq!("galactic".parse::<Frame>().unwrap(), Frame::Galactic);
        assert_eq!("Equatorial".parse::<Frame>().unwrap(), Frame::Equatorial);
        assert_eq!("ecliptic".parse::<Frame>().unwrap(), Frame::Other);
    }

    #[test]
    fn test_separation() {
        let a = SkyPoint::from_degrees(0.0, 0.0);
        let b = SkyPoint::from_degrees(90.0, 0.0);
        assert!((a.separation(&b).to_degrees() - 90.0).abs() < 1e-9);
    }
}
