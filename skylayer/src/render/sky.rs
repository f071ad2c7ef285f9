//! Whole-view rendering of a survey.

use std::collections::{HashSet, VecDeque};

use image::RgbaImage;
use tracing::{debug, trace};

use super::{Rasterizer, RenderSettings, ScreenPoint};
use crate::download::TileFetcher;
use crate::healpix::{self, IndexError, SkyPoint};
use crate::manager::TileManager;
use crate::tile::{TileRequest, ALLSKY_LEVEL};

/// Maps sky positions to destination raster coordinates.
///
/// Returns `None` for points that cannot be shown, such as points behind
/// the observer.
pub trait Projector {
    fn project(&self, point: &SkyPoint) -> Option<ScreenPoint>;
}

impl<F> Projector for F
where
    F: Fn(&SkyPoint) -> Option<ScreenPoint>,
{
    fn project(&self, point: &SkyPoint) -> Option<ScreenPoint> {
        self(point)
    }
}

/// Counts from one [`SkyRenderer::render_view`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Pixels drawn from a tile or a fallback.
    pub rendered: usize,
    /// Visible pixels with nothing to draw yet.
    pub missing: usize,
    /// Pixels examined by the flood fill.
    pub visited: usize,
}

/// Draws every visible sky pixel of the active survey.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkyRenderer {
    rasterizer: Rasterizer,
}

impl SkyRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            rasterizer: Rasterizer::new(settings),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        self.rasterizer.settings()
    }

    /// Render the view around `center` at `level`.
    ///
    /// Starting from the pixel under `center`, visits neighbours breadth-first
    /// and draws each pixel whose projected lattice overlaps `dest`. Levels
    /// below 3 draw level-3 cells of the all-sky composite; levels above the
    /// survey's maximum are clamped. Tiles that are not available yet are
    /// counted as missing and requested from `manager`.
    ///
    /// # Errors
    ///
    /// Only index errors from malformed pixel numbers, which indicate a bug.
    pub fn render_view<F, P>(
        &self,
        manager: &mut TileManager<F>,
        dest: &mut RgbaImage,
        level: u8,
        center: &SkyPoint,
        projector: &P,
    ) -> Result<RenderSummary, IndexError>
    where
        F: TileFetcher,
        P: Projector + ?Sized,
    {
        let mut summary = RenderSummary::default();
        let Some(source) = manager.source() else {
            return Ok(summary);
        };
        let frame = source.frame;
        let level = level.min(source.max_level);
        let use_allsky = level < ALLSKY_LEVEL;
        let draw_level = if use_allsky { ALLSKY_LEVEL } else { level };
        let nside = healpix::nside(draw_level)?;

        let steps = self.settings().subdivision.max(1);
        let blend = self.settings().blend();
        let bounds = (dest.width() as f32, dest.height() as f32);

        let start = healpix::index_in_frame(frame, draw_level, center)?;
        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::from([start]);

        while let Some(pix) = queue.pop_front() {
            summary.visited += 1;

            let lattice = healpix::corner_grid(frame, draw_level, pix, steps)?;
            let projected: Vec<Option<ScreenPoint>> =
                lattice.iter().map(|p| projector.project(p)).collect();

            if !overlaps(projected.iter().flatten(), bounds) {
                trace!(pix, "Pixel off screen");
                continue;
            }

            if let Some(points) = projected.into_iter().collect::<Option<Vec<_>>>() {
                let request = if use_allsky {
                    TileRequest::allsky(pix)
                } else {
                    TileRequest::tile(draw_level, pix)
                };
                match manager.request_tile(request, true)? {
                    Some(tile) => {
                        if let Err(e) = self
                            .rasterizer
                            .render_grid(dest, &points, steps, &tile, blend)
                        {
                            debug!(pix, error = %e, "Skipping malformed lattice");
                        }
                        summary.rendered += 1;
                    }
                    None => summary.missing += 1,
                }
            }

            for neighbour in healpix::neighbours(nside, pix)?.into_iter().flatten() {
                if seen.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }

        debug!(
            level = draw_level,
            allsky = use_allsky,
            rendered = summary.rendered,
            missing = summary.missing,
            visited = summary.visited,
            "Rendered view"
        );
        Ok(summary)
    }
}

/// Whether the bounding box of `points` intersects the raster.
fn overlaps<'a>(points: impl Iterator<Item = &'a ScreenPoint>, (width, height): (f32, f32)) -> bool {
    let mut min = ScreenPoint::new(f32::INFINITY, f32::INFINITY);
    let mut max = ScreenPoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    min.x <= max.x && max.x >= 0.0 && min.x <= width && max.y >= 0.0 && min.y <= height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::RecordingFetcher;
    use crate::manager::TileManagerConfig;
    use crate::source::{SurveySource, TileFormat};
    use std::f64::consts::FRAC_PI_2;

    fn manager() -> TileManager<RecordingFetcher> {
        let (fetcher, events) = RecordingFetcher::new();
        let mut manager = TileManager::new(fetcher, events, TileManagerConfig::default());
        manager.set_source(Some(
            SurveySource::new("Test", "http://sky.example/hips").with_format(TileFormat::Png),
        ));
        manager
    }

    /// Plate carrée over the whole sky: 360 × 180 pixels.
    fn plate_carree(p: &SkyPoint) -> Option<ScreenPoint> {
        Some(ScreenPoint::new(
            p.ra_degrees().rem_euclid(360.0) as f32,
            (90.0 - p.dec_degrees()) as f32,
        ))
    }

    #[test]
    fn test_no_source_renders_nothing() {
        let (fetcher, events) = RecordingFetcher::new();
        let mut manager = TileManager::new(fetcher, events, TileManagerConfig::default());
        let mut dest = RgbaImage::new(16, 16);
        let summary = SkyRenderer::default()
            .render_view(&mut manager, &mut dest, 3, &SkyPoint::new(0.0, 0.0), &plate_carree)
            .unwrap();
        assert_eq!(summary, RenderSummary::default());
    }

    #[test]
    fn test_missing_tiles_are_requested_once() {
        let mut manager = manager();
        let mut dest = RgbaImage::new(360, 180);
        let renderer = SkyRenderer::new(RenderSettings::default().with_subdivision(2));
        let center = SkyPoint::from_degrees(180.0, 0.0);

        let first = renderer
            .render_view(&mut manager, &mut dest, 1, &center, &plate_carree)
            .unwrap();
        assert_eq!(first.rendered, 0);
        assert!(first.missing > 0);
        assert!(first.visited <= 768);

        // Low levels share the single all-sky composite
        assert_eq!(manager.fetcher().call_count(), 1);
        assert!(manager.fetcher().calls()[0].2.ends_with("Norder3/Allsky.png"));

        renderer
            .render_view(&mut manager, &mut dest, 1, &center, &plate_carree)
            .unwrap();
        assert_eq!(manager.fetcher().call_count(), 1);
    }

    #[test]
    fn test_level_clamped_to_survey_maximum() {
        let mut manager = manager();
        manager.set_source(Some(
            SurveySource::new("Shallow", "http://sky.example/shallow")
                .with_format(TileFormat::Png)
                .with_max_level(4),
        ));
        let mut dest = RgbaImage::new(64, 64);
        let center = SkyPoint::from_degrees(10.0, 10.0);
        let near = move |p: &SkyPoint| {
            let dx = (p.ra_degrees() - 10.0) * 8.0 + 32.0;
            let dy = (10.0 - p.dec_degrees()) * 8.0 + 32.0;
            Some(ScreenPoint::new(dx as f32, dy as f32))
        };
        SkyRenderer::default()
            .render_view(&mut manager, &mut dest, 12, &center, &near)
            .unwrap();
        assert!(manager
            .fetcher()
            .calls()
            .iter()
            .all(|(_, key, _)| key.level == 4));
    }

    #[test]
    fn test_invisible_points_stop_the_fill() {
        let mut manager = manager();
        let mut dest = RgbaImage::new(32, 32);
        let hidden = |_: &SkyPoint| -> Option<ScreenPoint> { None };
        let summary = SkyRenderer::default()
            .render_view(&mut manager, &mut dest, 5, &SkyPoint::new(0.0, FRAC_PI_2 / 2.0), &hidden)
            .unwrap();
        assert_eq!(summary.visited, 1);
        assert_eq!(summary.rendered + summary.missing, 0);
    }
}
