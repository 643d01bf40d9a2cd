// ============================================================================
// STROKE RENDERING — round-capped segments into the mask buffer
// ============================================================================

use egui::{Pos2, Rect, pos2};
use image::Rgba;

use crate::canvas::{PixelBuffer, TRANSPARENT};
use crate::components::colors::on_pixel;
use crate::components::tools::CompositeMode;

/// Slack on the radius test so a pixel lying exactly on the stroke edge
/// survives f32 rounding.
const EDGE_EPSILON: f32 = 1e-4;

/// Render a round-capped segment of `brush_width` pixels from `start` to `end`.
///
/// Pixel `(x, y)` is covered when its sample point lies within
/// `brush_width / 2` of the segment.  Odd widths sample at the integer
/// coordinate and even widths at the pixel centre `(x + 0.5, y + 0.5)`, so a
/// stroke through whole-pixel points is exactly `brush_width` pixels thick.
/// Covered pixels become `color` at full opacity in [`CompositeMode::Paint`],
/// or fully transparent in [`CompositeMode::Erase`].  A zero-length segment
/// stamps a single dot.
///
/// Returns the touched region in buffer space, or `None` when the stroke
/// misses the buffer entirely.
pub fn draw_segment(
    buffer: &mut PixelBuffer,
    start: Pos2,
    end: Pos2,
    color: &str,
    brush_width: u32,
    mode: CompositeMode,
) -> Option<Rect> {
    let pixel = match mode {
        CompositeMode::Paint => on_pixel(color),
        CompositeMode::Erase => TRANSPARENT,
    };
    let width = brush_width.max(1);
    let sample_offset = if width % 2 == 0 { 0.5 } else { 0.0 };
    stamp_capsule(buffer, start, end, width as f32 / 2.0, sample_offset, pixel)
}

/// Squared distance from `p` to the segment `a`–`b`.
pub fn distance_sq_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    let t = if len_sq < 1e-12 {
        0.0
    } else {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a + ab * t;
    (p - closest).length_sq()
}

fn stamp_capsule(
    buffer: &mut PixelBuffer,
    start: Pos2,
    end: Pos2,
    radius: f32,
    sample_offset: f32,
    pixel: Rgba<u8>,
) -> Option<Rect> {
    if !(start.x.is_finite() && start.y.is_finite() && end.x.is_finite() && end.y.is_finite()) {
        return None;
    }
    let (width, height) = buffer.dimensions();

    let min_x = ((start.x.min(end.x) - radius - sample_offset).floor() as i64).max(0);
    let min_y = ((start.y.min(end.y) - radius - sample_offset).floor() as i64).max(0);
    let max_x = ((start.x.max(end.x) + radius - sample_offset).ceil() as i64).min(width as i64 - 1);
    let max_y = ((start.y.max(end.y) + radius - sample_offset).ceil() as i64).min(height as i64 - 1);
    if min_x > max_x || min_y > max_y {
        return None;
    }

    let limit_sq = radius * radius + EDGE_EPSILON;
    let stride = width as usize * 4;
    let raw = buffer.raw_mut();

    // Touched bounds (inclusive pixel coords)
    let mut bounds: Option<(i64, i64, i64, i64)> = None;

    for y in min_y..=max_y {
        let row_off = y as usize * stride;
        for x in min_x..=max_x {
            let p = pos2(x as f32 + sample_offset, y as f32 + sample_offset);
            if distance_sq_to_segment(p, start, end) > limit_sq {
                continue;
            }
            let off = row_off + x as usize * 4;
            raw[off..off + 4].copy_from_slice(&pixel.0);
            bounds = Some(match bounds {
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                None => (x, y, x, y),
            });
        }
    }

    bounds.map(|(x0, y0, x1, y1)| {
        Rect::from_min_max(
            pos2(x0 as f32, y0 as f32),
            pos2((x1 + 1) as f32, (y1 + 1) as f32),
        )
    })
}
