//! Render command - draw a gnomonic view of the survey into a PNG.

use std::path::PathBuf;
use std::time::Instant;

use image::{Rgba, RgbaImage};
use tracing::{debug, info};

use skylayer::download::TileFetcher;
use skylayer::healpix::{SkyPoint, MAX_LEVEL};
use skylayer::manager::TileManager;
use skylayer::render::{Projector, RenderSummary, ScreenPoint, SkyRenderer};

use crate::error::CliError;
use crate::runner::{runtime, CliRunner, GlobalOptions};

/// Render passes before giving up on tiles that never arrive.
const MAX_PASSES: usize = 12;

/// Angular width of a level-0 pixel in degrees, roughly `sqrt(4pi / 12)`.
const LEVEL0_PIXEL_DEGREES: f64 = 58.6;

/// Background of sky areas with no data.
const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Arguments for the render command.
pub struct RenderArgs {
    pub ra: f64,
    pub dec: f64,
    pub fov: f64,
    pub level: Option<u8>,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
}

/// Run the render command.
pub fn run(options: GlobalOptions, args: RenderArgs) -> Result<(), CliError> {
    if !(args.fov > 0.0 && args.fov < 180.0) {
        return Err(CliError::Config(format!(
            "field of view must be between 0 and 180 degrees, got {}",
            args.fov
        )));
    }
    if args.width == 0 || args.height == 0 {
        return Err(CliError::Config("image size must be non-zero".to_string()));
    }

    let runner = CliRunner::new(options)?;
    runner.log_startup("render");
    let source = runner.survey()?;
    let level = args
        .level
        .unwrap_or_else(|| auto_level(args.fov, args.width, source.tile_width, source.max_level));

    println!("Rendering {}", source.title);
    println!("  Centre: ra={} dec={}", args.ra, args.dec);
    println!("  Field:  {} deg, level {}", args.fov, level);

    let center = SkyPoint::from_degrees(args.ra, args.dec);
    let projector = Gnomonic::new(center, args.fov, args.width, args.height);
    let renderer = SkyRenderer::new(runner.config().render_settings());
    let mut dest = RgbaImage::from_pixel(args.width, args.height, BACKGROUND);

    let start = Instant::now();
    let summary = runtime()?.block_on(async {
        let mut manager = runner.create_manager(source).await?;
        render_until_complete(&mut manager, &renderer, &mut dest, level, &center, &projector).await
    })?;

    info!(
        rendered = summary.rendered,
        missing = summary.missing,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "View rendered"
    );
    println!(
        "Rendered {} tiles ({} missing) in {:.2}s",
        summary.rendered,
        summary.missing,
        start.elapsed().as_secs_f64()
    );

    runner.save_png(&args.output, &dest)
}

/// Render, wait for the downloads that pass started, and repeat until
/// nothing is missing or nothing more can arrive.
///
/// Every pass starts from a blank background, so translucent layers and
/// earlier fallbacks never accumulate.
async fn render_until_complete<F, P>(
    manager: &mut TileManager<F>,
    renderer: &SkyRenderer,
    dest: &mut RgbaImage,
    level: u8,
    center: &SkyPoint,
    projector: &P,
) -> Result<RenderSummary, CliError>
where
    F: TileFetcher,
    P: Projector,
{
    let mut summary = RenderSummary::default();
    for pass in 1..=MAX_PASSES {
        *dest = RgbaImage::from_pixel(dest.width(), dest.height(), BACKGROUND);
        summary = renderer.render_view(manager, dest, level, center, projector)?;
        debug!(pass, rendered = summary.rendered, missing = summary.missing, "Render pass");
        if summary.missing == 0 {
            break;
        }

        let mut arrived = 0;
        while manager.fetcher().in_flight() > 0 {
            match manager.next_completion().await {
                Some(completion) if completion.needs_repaint() => arrived += 1,
                Some(_) => {}
                None => break,
            }
        }
        arrived += manager.poll_completions();
        if arrived == 0 {
            break;
        }
    }
    Ok(summary)
}

/// Pick the shallowest level whose tile pixels are no coarser than the
/// screen pixels of the view.
fn auto_level(fov: f64, width: u32, tile_width: u32, max_level: u8) -> u8 {
    let screen = fov / width.max(1) as f64;
    let mut level = 0;
    while level < max_level.min(MAX_LEVEL) {
        let texel = LEVEL0_PIXEL_DEGREES / (1u64 << level) as f64 / tile_width.max(1) as f64;
        if texel <= screen {
            break;
        }
        level += 1;
    }
    level
}

/// Gnomonic (tangent-plane) projection centred on a sky position.
///
/// East is to the left, as seen looking out at the sky.
#[derive(Debug, Clone, Copy)]
struct Gnomonic {
    ra0: f64,
    sin_dec0: f64,
    cos_dec0: f64,
    scale: f64,
    cx: f64,
    cy: f64,
}

impl Gnomonic {
    /// Points closer than this cosine to the horizon of the tangent plane
    /// are not projected.
    const MIN_COS: f64 = 0.01;

    fn new(center: SkyPoint, fov_degrees: f64, width: u32, height: u32) -> Self {
        let half = (fov_degrees / 2.0).to_radians();
        Self {
            ra0: center.ra,
            sin_dec0: center.dec.sin(),
            cos_dec0: center.dec.cos(),
            scale: (width as f64 / 2.0) / half.tan(),
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }
}

impl Projector for Gnomonic {
    fn project(&self, point: &SkyPoint) -> Option<ScreenPoint> {
        let (sin_dec, cos_dec) = point.dec.sin_cos();
        let (sin_dra, cos_dra) = (point.ra - self.ra0).sin_cos();
        let cos_c = self.sin_dec0 * sin_dec + self.cos_dec0 * cos_dec * cos_dra;
        if cos_c < Self::MIN_COS {
            return None;
        }
        let x = cos_dec * sin_dra / cos_c;
        let y = (self.cos_dec0 * sin_dec - self.sin_dec0 * cos_dec * cos_dra) / cos_c;
        Some(ScreenPoint::new(
            (self.cx - x * self.scale) as f32,
            (self.cy - y * self.scale) as f32,
        ))
    }
}
