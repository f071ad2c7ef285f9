//! Per-span texture sampling and pixel writes.

use super::scan::Span;
use super::{Blend, Interpolation};
use crate::tile::{TileImage, BYTES_PER_PIXEL};

/// 16.16 fixed point scale.
const FIXED_ONE: f32 = 65536.0;
const FIXED_SHIFT: u32 = 16;

/// Sources with effective alpha at or below this leave the destination alone.
const MIN_ALPHA: f32 = 1.0 / 256.0;

/// Fill one span of `dest` from `src`.
pub(crate) fn draw_span(
    dest: &mut [u8],
    dest_width: u32,
    span: &Span,
    src: &TileImage,
    interpolation: Interpolation,
    blend: Blend,
) {
    let row = span.y as usize * dest_width as usize * BYTES_PER_PIXEL;
    let start = row + span.x_start as usize * BYTES_PER_PIXEL;
    let end = row + span.x_end as usize * BYTES_PER_PIXEL;
    let out = &mut dest[start..end];

    match interpolation {
        Interpolation::Nearest => nearest_span(out, span, src, blend),
        Interpolation::Bilinear => bilinear_span(out, span, src, blend),
    }
}

/// Nearest sampling with 16.16 fixed-point texture stepping.
fn nearest_span(out: &mut [u8], span: &Span, src: &TileImage, blend: Blend) {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return;
    }
    let max_x = sw as i64 - 1;
    let max_y = sh as i64 - 1;
    let pixels = src.as_raw();

    let mut fu = (span.u * sw as f32 * FIXED_ONE).round() as i64;
    let mut fv = (span.v * sh as f32 * FIXED_ONE).round() as i64;
    let fdu = (span.du * sw as f32 * FIXED_ONE).round() as i64;
    let fdv = (span.dv * sh as f32 * FIXED_ONE).round() as i64;

    for dst in out.chunks_exact_mut(BYTES_PER_PIXEL) {
        let sx = (fu >> FIXED_SHIFT).clamp(0, max_x) as usize;
        let sy = (fv >> FIXED_SHIFT).clamp(0, max_y) as usize;
        let offset = (sy * sw as usize + sx) * BYTES_PER_PIXEL;
        let texel = [
            pixels[offset],
            pixels[offset + 1],
            pixels[offset + 2],
            pixels[offset + 3],
        ];
        write_pixel(dst, texel.map(f32::from), blend);

        fu += fdu;
        fv += fdv;
    }
}

/// Four-sample bilinear filtering around the sample point.
fn bilinear_span(out: &mut [u8], span: &Span, src: &TileImage, blend: Blend) {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return;
    }
    let max_x = (sw - 1) as f32;
    let max_y = (sh - 1) as f32;
    let stride = sw as usize;
    let pixels = src.as_raw();

    let mut u = span.u;
    let mut v = span.v;
    for dst in out.chunks_exact_mut(BYTES_PER_PIXEL) {
        let su = (u * sw as f32 - 0.5).clamp(0.0, max_x);
        let sv = (v * sh as f32 - 0.5).clamp(0.0, max_y);
        let x0 = su.floor();
        let y0 = sv.floor();
        let fx = su - x0;
        let fy = sv - y0;
        let x0 = x0 as usize;
        let y0 = y0 as usize;
        let x1 = (x0 + 1).min(sw as usize - 1);
        let y1 = (y0 + 1).min(sh as usize - 1);

        let a = (y0 * stride + x0) * BYTES_PER_PIXEL;
        let b = (y0 * stride + x1) * BYTES_PER_PIXEL;
        let c = (y1 * stride + x0) * BYTES_PER_PIXEL;
        let d = (y1 * stride + x1) * BYTES_PER_PIXEL;

        let wa = (1.0 - fx) * (1.0 - fy);
        let wb = fx * (1.0 - fy);
        let wc = (1.0 - fx) * fy;
        let wd = fx * fy;

        let mut texel = [0.0f32; 4];
        for (ch, value) in texel.iter_mut().enumerate() {
            *value = pixels[a + ch] as f32 * wa
                + pixels[b + ch] as f32 * wb
                + pixels[c + ch] as f32 * wc
                + pixels[d + ch] as f32 * wd;
        }
        write_pixel(dst, texel, blend);

        u += span.du;
        v += span.dv;
    }
}

/// Store one sampled texel according to the blend mode.
#[inline]
fn write_pixel(dst: &mut [u8], texel: [f32; 4], blend: Blend) {
    match blend {
        Blend::Replace => {
            dst[0] = to_channel(texel[0]);
            dst[1] = to_channel(texel[1]);
            dst[2] = to_channel(texel[2]);
            dst[3] = u8::MAX;
        }
        Blend::Alpha { opacity } => {
            let alpha = texel[3] / 255.0 * opacity;
            if alpha <= MIN_ALPHA {
                return;
            }
            for ch in 0..3 {
                let d = dst[ch] as f32;
                dst[ch] = to_channel(d + alpha * (texel[ch] - d));
            }
            let da = dst[3] as f32;
            dst[3] = to_channel(da + alpha * (255.0 - da));
        }
    }
}

/// Blend a flat colour into one span.
pub(crate) fn fill_span(dest: &mut [u8], dest_width: u32, span: &Span, color: [u8; 4]) {
    let row = span.y as usize * dest_width as usize * BYTES_PER_PIXEL;
    let start = row + span.x_start as usize * BYTES_PER_PIXEL;
    let end = row + span.x_end as usize * BYTES_PER_PIXEL;
    let blend = Blend::Alpha { opacity: 1.0 };
    let texel = color.map(f32::from);
    for dst in dest[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
        write_pixel(dst, texel, blend);
    }
}

#[inline]
fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
