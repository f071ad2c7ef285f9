//! Scanline rasterization of tiles onto a destination image.
//!
//! A tile's footprint on screen is the projection of a curved spherical
//! quadrilateral. The [`Rasterizer`] approximates it with flat quads: either
//! an N×N bilinear subdivision of the four projected corners, or an explicit
//! lattice of projected points ([`Rasterizer::render_grid`]).
//!
//! ```text
//!   sky pixel ──corner_grid──▶ sky lattice ──Projector──▶ screen lattice
//!                                                             │
//!   TileManager ──request_tile──▶ TileImage ──────────────────┤
//!                                                             ▼
//!                                                 Rasterizer::render_grid
//! ```
//!
//! # Coordinates
//!
//! Screen coordinates are continuous: pixel `(x, y)` covers
//! `[x, x+1) × [y, y+1)` and is sampled at its centre, so a quad with
//! corners `(0,0)`, `(W,0)`, `(W,H)`, `(0,H)` is exactly a `W×H` raster.
//! Texture coordinates run over `[0, 1]` with `u` along the tile's columns
//! and `v` along its rows. Samples outside the tile clamp to its edge.

mod sample;
mod scan;
mod sky;

pub use sky::{Projector, RenderSummary, SkyRenderer};

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use thiserror::Error;

use crate::tile::TileImage;
use scan::{for_each_span, Vertex};

/// Texture coordinates of a tile's four sky corners, in corner order.
pub const TILE_UV: [(f32, f32); 4] = [(1.0, 1.0), (1.0, 0.0), (0.0, 0.0), (0.0, 1.0)];

/// Default subdivision of each tile edge.
pub const DEFAULT_SUBDIVISION: u32 = 4;

/// Upper bound on the subdivision factor.
pub const MAX_SUBDIVISION: u32 = 64;

/// A point in destination raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Texture sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

impl Interpolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
        }
    }
}

impl FromStr for Interpolation {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Interpolation::Nearest),
            "bilinear" => Ok(Interpolation::Bilinear),
            other => Err(RenderError::UnknownInterpolation(other.to_string())),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How sampled texels combine with the destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Blend {
    /// Overwrite the destination; output is fully opaque.
    Replace,
    /// Blend by source alpha scaled by `opacity` in `[0, 1]`.
    Alpha { opacity: f32 },
}

/// Rasterizer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("screen lattice has {actual} points, expected {expected}")]
    GridSize { expected: usize, actual: usize },

    #[error("unknown interpolation mode: {0}")]
    UnknownInterpolation(String),
}

/// Settings shared by every tile drawn in a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub interpolation: Interpolation,
    /// Edge subdivision per tile; 1 draws one flat quad.
    pub subdivision: u32,
    /// Global opacity in `[0, 1]`.
    pub opacity: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            subdivision: DEFAULT_SUBDIVISION,
            opacity: 1.0,
        }
    }
}

impl RenderSettings {
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the subdivision, clamped to `1..=MAX_SUBDIVISION`.
    pub fn with_subdivision(mut self, subdivision: u32) -> Self {
        self.subdivision = subdivision.clamp(1, MAX_SUBDIVISION);
        self
    }

    /// Set the opacity, clamped to `[0, 1]`.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        self
    }

    /// Blend mode implied by the opacity.
    pub fn blend(&self) -> Blend {
        if self.opacity >= 1.0 {
            Blend::Replace
        } else {
            Blend::Alpha {
                opacity: self.opacity,
            }
        }
    }
}

/// Draws textured quads into an RGBA raster.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rasterizer {
    settings: RenderSettings,
}

impl Rasterizer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Draw a sky tile whose projected corners are `quad`, in corner order.
    ///
    /// Overwrites the covered destination pixels.
    pub fn render_tile(&self, dest: &mut RgbaImage, quad: &[ScreenPoint; 4], tile: &TileImage) {
        self.render_tile_with_uv(dest, quad, &TILE_UV, tile, Blend::Replace);
    }

    /// Like [`render_tile`](Self::render_tile) but blends by source alpha
    /// times `opacity`.
    ///
    /// An opacity of 0 leaves `dest` untouched.
    pub fn render_tile_alpha(
        &self,
        dest: &mut RgbaImage,
        quad: &[ScreenPoint; 4],
        tile: &TileImage,
        opacity: f32,
    ) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.render_tile_with_uv(dest, quad, &TILE_UV, tile, Blend::Alpha { opacity });
    }

    /// Draw `tile` into `quad` with explicit corner texture coordinates.
    ///
    /// The quad is split into `subdivision × subdivision` sub-quads whose
    /// corners and texture coordinates are interpolated from the outer ones;
    /// each is scan-converted on its own.
    ///
    /// # Arguments
    ///
    /// * `dest` - Destination raster
    /// * `quad` - Screen corners, either winding
    /// * `uv` - Texture coordinate of each corner
    /// * `tile` - Source image
    /// * `blend` - Overwrite or alpha-blend
    pub fn render_tile_with_uv(
        &self,
        dest: &mut RgbaImage,
        quad: &[ScreenPoint; 4],
        uv: &[(f32, f32); 4],
        tile: &TileImage,
        blend: Blend,
    ) {
        let n = self.settings.subdivision.max(1);
        if n == 1 {
            self.draw_quad(dest, &vertices(quad, uv), tile, blend);
            return;
        }

        let uv_points = uv.map(|(u, v)| ScreenPoint::new(u, v));
        let nf = n as f32;
        let [a, b, c, d] = *quad;
        let [auv, buv, cuv, duv] = uv_points;

        for i in 0..n {
            let t0 = i as f32 / nf;
            let t1 = (i + 1) as f32 / nf;
            let p1 = a.lerp(d, t0);
            let p2 = b.lerp(c, t0);
            let q1 = a.lerp(d, t1);
            let q2 = b.lerp(c, t1);
            let p1uv = auv.lerp(duv, t0);
            let p2uv = buv.lerp(cuv, t0);
            let q1uv = auv.lerp(duv, t1);
            let q2uv = buv.lerp(cuv, t1);

            for j in 0..n {
                let s0 = j as f32 / nf;
                let s1 = (j + 1) as f32 / nf;
                let sub = [p1.lerp(p2, s0), p1.lerp(p2, s1), q1.lerp(q2, s1), q1.lerp(q2, s0)];
                let sub_uv = [
                    p1uv.lerp(p2uv, s0),
                    p1uv.lerp(p2uv, s1),
                    q1uv.lerp(q2uv, s1),
                    q1uv.lerp(q2uv, s0),
                ]
                .map(|p| (p.x, p.y));
                self.draw_quad(dest, &vertices(&sub, &sub_uv), tile, blend);
            }
        }
    }

    /// Draw `tile` over a `(steps + 1)²` lattice of screen points.
    ///
    /// Points are row-major; row `r`, column `c` carries texture coordinate
    /// `(c / steps, r / steps)`. Each lattice cell is drawn as one flat quad,
    /// so the subdivision setting does not apply.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::GridSize`] if `points` has the wrong length.
    pub fn render_grid(
        &self,
        dest: &mut RgbaImage,
        points: &[ScreenPoint],
        steps: u32,
        tile: &TileImage,
        blend: Blend,
    ) -> Result<(), RenderError> {
        let steps = steps.max(1) as usize;
        let side = steps + 1;
        if points.len() != side * side {
            return Err(RenderError::GridSize {
                expected: side * side,
                actual: points.len(),
            });
        }

        let inv = 1.0 / steps as f32;
        for r in 0..steps {
            for c in 0..steps {
                let (u0, u1) = (c as f32 * inv, (c + 1) as f32 * inv);
                let (v0, v1) = (r as f32 * inv, (r + 1) as f32 * inv);
                let quad = [
                    points[(r + 1) * side + c + 1],
                    points[r * side + c + 1],
                    points[r * side + c],
                    points[(r + 1) * side + c],
                ];
                let uv = [(u1, v1), (u1, v0), (u0, v0), (u0, v1)];
                self.draw_quad(dest, &vertices(&quad, &uv), tile, blend);
            }
        }
        Ok(())
    }

    /// Fill `quad` with a flat colour, blended by the colour's alpha.
    pub fn fill_quad(&self, dest: &mut RgbaImage, quad: &[ScreenPoint; 4], color: [u8; 4]) {
        let (width, height) = dest.dimensions();
        let verts = vertices(quad, &TILE_UV);
        let pixels: &mut [u8] = dest;
        for_each_span(&verts, width, height, |span| {
            sample::fill_span(pixels, width, &span, color)
        });
    }

    fn draw_quad(&self, dest: &mut RgbaImage, quad: &[Vertex; 4], tile: &TileImage, blend: Blend) {
        let (width, height) = dest.dimensions();
        let interpolation = self.settings.interpolation;
        let pixels: &mut [u8] = dest;
        for_each_span(quad, width, height, |span| {
            sample::draw_span(pixels, width, &span, tile, interpolation, blend)
        });
    }
}

fn vertices(quad: &[ScreenPoint; 4], uv: &[(f32, f32); 4]) -> [Vertex; 4] {
    std::array::from_fn(|k| Vertex {
        x: quad[k].x,
        y: quad[k].y,
        u: uv[k].0,
        v: uv[k].1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const IDENTITY_UV: [(f32, f32); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

    fn full_quad(width: u32, height: u32) -> [ScreenPoint; 4] {
        let (w, h) = (width as f32, height as f32);
        [
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(w, 0.0),
            ScreenPoint::new(w, h),
            ScreenPoint::new(0.0, h),
        ]
    }

    /// Opaque image where every pixel is distinct.
    fn pattern(width: u32, height: u32) -> TileImage {
        TileImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    fn nearest(subdivision: u32) -> Rasterizer {
        Rasterizer::new(
            RenderSettings::default()
                .with_interpolation(Interpolation::Nearest)
                .with_subdivision(subdivision),
        )
    }

    #[test]
    fn test_identity_nearest() {
        let src = pattern(37, 23);
        let mut dest = RgbaImage::new(37, 23);
        nearest(1).render_tile_with_uv(&mut dest, &full_quad(37, 23), &IDENTITY_UV, &src, Blend::Replace);
        assert_eq!(dest, src);
    }

    #[test]
    fn test_identity_nearest_subdivided() {
        let src = pattern(64, 64);
        let mut dest = RgbaImage::new(64, 64);
        nearest(4).render_tile_with_uv(&mut dest, &full_quad(64, 64), &IDENTITY_UV, &src, Blend::Replace);
        assert_eq!(dest, src);
    }

    #[test]
    fn test_identity_bilinear() {
        let src = pattern(16, 16);
        let mut dest = RgbaImage::new(16, 16);
        let rasterizer = Rasterizer::new(RenderSettings::default().with_subdivision(1));
        rasterizer.render_tile_with_uv(&mut dest, &full_quad(16, 16), &IDENTITY_UV, &src, Blend::Replace);
        assert_eq!(dest, src);
    }

    #[test]
    fn test_upscale_nearest() {
        let mut src = TileImage::new(2, 2);
        src.put_pixel(0, 0, Rgba([10, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([20, 0, 0, 255]));
        src.put_pixel(0, 1, Rgba([30, 0, 0, 255]));
        src.put_pixel(1, 1, Rgba([40, 0, 0, 255]));

        let mut dest = RgbaImage::new(4, 4);
        nearest(1).render_tile_with_uv(&mut dest, &full_quad(4, 4), &IDENTITY_UV, &src, Blend::Replace);
        assert_eq!(dest.get_pixel(1, 1)[0], 10);
        assert_eq!(dest.get_pixel(2, 1)[0], 20);
        assert_eq!(dest.get_pixel(1, 2)[0], 30);
        assert_eq!(dest.get_pixel(3, 3)[0], 40);
    }

    #[test]
    fn test_tile_uv_orientation() {
        // Corner 2 (uv 0,0) top-left and corner 1 (uv 1,0) bottom-left
        // draws the transpose of the source
        let src = pattern(8, 8);
        let [tl, tr, br, bl] = full_quad(8, 8);
        let quad = [br, bl, tl, tr];
        let mut dest = RgbaImage::new(8, 8);
        nearest(1).render_tile(&mut dest, &quad, &src);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(dest.get_pixel(x, y), src.get_pixel(y, x));
            }
        }
    }

    #[test]
    fn test_opacity_zero_leaves_dest() {
        let src = pattern(8, 8);
        let original = TileImage::from_pixel(8, 8, Rgba([3, 4, 5, 6]));
        let mut dest = original.clone();
        nearest(2).render_tile_alpha(&mut dest, &full_quad(8, 8), &src, 0.0);
        assert_eq!(dest, original);
    }

    #[test]
    fn test_opacity_one_opaque_source_replaces() {
        let src = pattern(8, 8);
        let mut dest = TileImage::from_pixel(8, 8, Rgba([3, 4, 5, 6]));
        nearest(1).render_tile_with_uv(
            &mut dest,
            &full_quad(8, 8),
            &IDENTITY_UV,
            &src,
            Blend::Alpha { opacity: 1.0 },
        );
        assert_eq!(dest, src);
    }

    #[test]
    fn test_transparent_source_pixels_skipped() {
        let src = TileImage::from_pixel(4, 4, Rgba([255, 255, 255, 0]));
        let original = TileImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let mut dest = original.clone();
        nearest(1).render_tile_alpha(&mut dest, &full_quad(4, 4), &src, 1.0);
        assert_eq!(dest, original);
    }

    #[test]
    fn test_partially_offscreen_quad_is_clipped() {
        let src = TileImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]));
        let mut dest = RgbaImage::new(4, 4);
        let quad = [
            ScreenPoint::new(-2.0, -2.0),
            ScreenPoint::new(2.0, -2.0),
            ScreenPoint::new(2.0, 2.0),
            ScreenPoint::new(-2.0, 2.0),
        ];
        nearest(3).render_tile_with_uv(&mut dest, &quad, &IDENTITY_UV, &src, Blend::Replace);
        assert_eq!(dest.get_pixel(0, 0), &Rgba([9, 9, 9, 255]));
        assert_eq!(dest.get_pixel(1, 1), &Rgba([9, 9, 9, 255]));
        assert_eq!(dest.get_pixel(2, 2), &Rgba([0, 0, 0, 0]));
        assert_eq!(dest.get_pixel(3, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_render_grid_identity() {
        let src = pattern(12, 12);
        let steps = 3;
        let points: Vec<ScreenPoint> = (0..=steps)
            .flat_map(|r| (0..=steps).map(move |c| ScreenPoint::new(c as f32 * 4.0, r as f32 * 4.0)))
            .collect();
        let mut dest = RgbaImage::new(12, 12);
        nearest(1)
            .render_grid(&mut dest, &points, steps, &src, Blend::Replace)
            .unwrap();
        assert_eq!(dest, src);
    }

    #[test]
    fn test_render_grid_wrong_size() {
        let src = pattern(4, 4);
        let mut dest = RgbaImage::new(4, 4);
        let result = nearest(1).render_grid(&mut dest, &[ScreenPoint::default(); 5], 1, &src, Blend::Replace);
        assert_eq!(result, Err(RenderError::GridSize { expected: 4, actual: 5 }));
    }

    #[test]
    fn test_fill_quad() {
        let mut dest = RgbaImage::new(4, 4);
        nearest(1).fill_quad(&mut dest, &full_quad(2, 2), [0, 255, 0, 255]);
        assert_eq!(dest.get_pixel(1, 1), &Rgba([0, 255, 0, 255]));
        assert_eq!(dest.get_pixel(2, 2), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_settings_builders() {
        let settings = RenderSettings::default()
            .with_subdivision(0)
            .with_opacity(1.5);
        assert_eq!(settings.subdivision, 1);
        assert_eq!(settings.opacity, 1.0);
        assert_eq!(settings.blend(), Blend::Replace);
        assert_eq!(
            RenderSettings::default().with_opacity(0.25).blend(),
            Blend::Alpha { opacity: 0.25 }
        );
    }

    #[test]
    fn test_interpolation_parse() {
        assert_eq!("Nearest".parse::<Interpolation>().unwrap(), Interpolation::Nearest);
        assert_eq!(" bilinear ".parse::<Interpolation>().unwrap(), Interpolation::Bilinear);
        assert!("cubic".parse::<Interpolation>().is_err());
        assert_eq!(Interpolation::default().to_string(), "bilinear");
    }
}
