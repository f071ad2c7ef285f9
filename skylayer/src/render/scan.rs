//! Scanline span generation for screen-space quads.
//!
//! Pixel `(x, y)` covers `[x, x+1) x [y, y+1)` and belongs to a polygon when
//! its centre does. For each row the four edges are intersected with the
//! horizontal line through the row's pixel centres; the leftmost and
//! rightmost crossings, with their interpolated texture coordinates, bound
//! the row's span. Edges are treated as half-open in y so a vertex lying
//! exactly on a centre line is counted once.

/// A quad corner with its texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Vertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

/// One row's run of covered pixels, `x_start..x_end`, clipped to the raster.
///
/// Texture coordinates are given at the centre of `x_start` plus a per-pixel
/// step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Span {
    pub y: u32,
    pub x_start: u32,
    pub x_end: u32,
    pub u: f32,
    pub v: f32,
    pub du: f32,
    pub dv: f32,
}

#[derive(Clone, Copy)]
struct Crossing {
    x: f32,
    u: f32,
    v: f32,
}

/// Calls `emit` for every non-empty span of `quad` inside a
/// `width x height` raster, top to bottom.
pub(crate) fn for_each_span(quad: &[Vertex; 4], width: u32, height: u32, mut emit: impl FnMut(Span)) {
    if width == 0 || height == 0 || quad.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return;
    }

    let min_y = quad.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = quad.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

    // Rows whose centre y + 0.5 lies in [min_y, max_y)
    let first = (min_y - 0.5).ceil().max(0.0);
    let last = (max_y - 0.5).ceil().min(height as f32);
    if first >= last {
        return;
    }

    for y in first as u32..last as u32 {
        let yc = y as f32 + 0.5;
        let Some((left, right)) = row_bounds(quad, yc) else {
            continue;
        };
        let span_width = right.x - left.x;
        if span_width <= 0.0 {
            continue;
        }

        let x_start = (left.x - 0.5).ceil().max(0.0);
        let x_end = (right.x - 0.5).ceil().min(width as f32);
        if x_start >= x_end {
            continue;
        }

        let du = (right.u - left.u) / span_width;
        let dv = (right.v - left.v) / span_width;
        let offset = x_start + 0.5 - left.x;
        emit(Span {
            y,
            x_start: x_start as u32,
            x_end: x_end as u32,
            u: left.u + du * offset,
            v: left.v + dv * offset,
            du,
            dv,
        });
    }
}

/// Leftmost and rightmost edge crossings of the line `y = yc`.
fn row_bounds(quad: &[Vertex; 4], yc: f32) -> Option<(Crossing, Crossing)> {
    let mut left: Option<Crossing> = None;
    let mut right: Option<Crossing> = None;

    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        if a.y == b.y {
            continue;
        }
        let (top, bottom) = if a.y < b.y { (a, b) } else { (b, a) };
        if yc < top.y || yc >= bottom.y {
            continue;
        }

        let t = (yc - top.y) / (bottom.y - top.y);
        let crossing = Crossing {
            x: top.x + t * (bottom.x - top.x),
            u: top.u + t * (bottom.u - top.u),
            v: top.v + t * (bottom.v - top.v),
        };
        if left.map_or(true, |l| crossing.x < l.x) {
            left = Some(crossing);
        }
        if right.map_or(true, |r| crossing.x > r.x) {
            right = Some(crossing);
        }
    }

    Some((left?, right?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32) -> Vertex {
        Vertex { x, y, u: 0.0, v: 0.0 }
    }

    fn collect(quad: &[Vertex; 4], width: u32, height: u32) -> Vec<Span> {
        let mut spans = Vec::new();
        for_each_span(quad, width, height, |span| spans.push(span));
        spans
    }

    #[test]
    fn test_full_raster_rectangle() {
        let quad = [
            Vertex { x: 0.0, y: 0.0, u: 0.0, v: 0.0 },
            Vertex { x: 4.0, y: 0.0, u: 1.0, v: 0.0 },
            Vertex { x: 4.0, y: 2.0, u: 1.0, v: 1.0 },
            Vertex { x: 0.0, y: 2.0, u: 0.0, v: 1.0 },
        ];
        let spans = collect(&quad, 4, 2);
        assert_eq!(spans.len(), 2);
        for (row, span) in spans.iter().enumerate() {
            assert_eq!(span.y, row as u32);
            assert_eq!((span.x_start, span.x_end), (0, 4));
            assert!((span.u - 0.125).abs() < 1e-6);
            assert!((span.du - 0.25).abs() < 1e-6);
            assert!((span.v - (row as f32 + 0.5) / 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_orientation_independent() {
        let cw = [vertex(1.0, 1.0), vertex(5.0, 1.0), vertex(5.0, 4.0), vertex(1.0, 4.0)];
        let ccw = [cw[3], cw[2], cw[1], cw[0]];
        let a: Vec<_> = collect(&cw, 8, 8).iter().map(|s| (s.y, s.x_start, s.x_end)).collect();
        let b: Vec<_> = collect(&ccw, 8, 8).iter().map(|s| (s.y, s.x_start, s.x_end)).collect();
        assert_eq!(a, b);
        assert_eq!(a, vec![(1, 1, 5), (2, 1, 5), (3, 1, 5)]);
    }

    #[test]
    fn test_clipped_to_raster() {
        let quad = [vertex(-10.0, -10.0), vertex(20.0, -10.0), vertex(20.0, 20.0), vertex(-10.0, 20.0)];
        let spans = collect(&quad, 3, 2);
        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| s.x_start == 0 && s.x_end == 3));
    }

    #[test]
    fn test_offscreen_and_degenerate() {
        let off = [vertex(10.0, 10.0), vertex(12.0, 10.0), vertex(12.0, 12.0), vertex(10.0, 12.0)];
        assert!(collect(&off, 4, 4).is_empty());

        let flat = [vertex(0.0, 1.0), vertex(4.0, 1.0), vertex(4.0, 1.0), vertex(0.0, 1.0)];
        assert!(collect(&flat, 4, 4).is_empty());

        let nan = [vertex(f32::NAN, 0.0), vertex(4.0, 0.0), vertex(4.0, 4.0), vertex(0.0, 4.0)];
        assert!(collect(&nan, 4, 4).is_empty());
    }

    #[test]
    fn test_adjacent_quads_do_not_overlap() {
        let left = [vertex(0.0, 0.0), vertex(2.5, 0.0), vertex(2.5, 3.0), vertex(0.0, 3.0)];
        let right = [vertex(2.5, 0.0), vertex(6.0, 0.0), vertex(6.0, 3.0), vertex(2.5, 3.0)];
        let mut covered = vec![0u8; 6 * 3];
        for quad in [&left, &right] {
            for span in collect(quad, 6, 3) {
                for x in span.x_start..span.x_end {
                    covered[(span.y * 6 + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_triangle_like_quad() {
        // Diamond: widest in the middle row
        let quad = [vertex(3.0, 0.0), vertex(6.0, 3.0), vertex(3.0, 6.0), vertex(0.0, 3.0)];
        let spans = collect(&quad, 6, 6);
        assert_eq!(spans.len(), 6);
        let widths: Vec<u32> = spans.iter().map(|s| s.x_end - s.x_start).collect();
        assert!(widths[2] >= widths[0]);
        assert_eq!(widths[0], widths[5]);
    }
}
