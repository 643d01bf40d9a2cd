use egui::{Rect, pos2};

use crate::canvas::PixelBuffer;
use crate::components::colors::on_pixel;
use crate::error::MaskError;

/// Result of a completed flood fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillOutcome {
    /// Number of pixels recoloured.  Zero when the seed already had the fill color.
    pub filled: usize,
    /// Bounding box of the recoloured pixels in buffer space.
    pub bounds: Option<Rect>,
}

impl FillOutcome {
    pub fn changed(&self) -> bool {
        self.filled > 0
    }
}

/// 4-connected flood fill from `(seed_x, seed_y)` with `fill_color` at full opacity.
///
/// The region is every pixel reachable through horizontal/vertical neighbours
/// whose R, G, B and A all equal the seed pixel's (no tolerance).  Filling a
/// region that already has the fill color is a no-op.  A seed outside the
/// buffer is rejected before anything is touched.
pub fn flood_fill(
    buffer: &mut PixelBuffer,
    seed_x: i64,
    seed_y: i64,
    fill_color: &str,
) -> Result<FillOutcome, MaskError> {
    let (w, h) = buffer.dimensions();
    if !buffer.in_bounds(seed_x, seed_y) {
        crate::log_warn!("Fill seed ({}, {}) outside {}×{} buffer", seed_x, seed_y, w, h);
        return Err(MaskError::OutOfBoundsSeed {
            x: seed_x,
            y: seed_y,
            width: w,
            height: h,
        });
    }

    let fill = on_pixel(fill_color).0;
    let wu = w as usize;
    let seed_idx = seed_y as usize * wu + seed_x as usize;
    let raw = buffer.raw_mut();

    #[inline(always)]
    fn pix(flat: &[u8], idx: usize) -> [u8; 4] {
        let o = idx * 4;
        [flat[o], flat[o + 1], flat[o + 2], flat[o + 3]]
    }

    #[inline(always)]
    fn set(flat: &mut [u8], idx: usize, p: [u8; 4]) {
        let o = idx * 4;
        flat[o..o + 4].copy_from_slice(&p);
    }

    let target = pix(raw, seed_idx);
    if target == fill {
        return Ok(FillOutcome {
            filled: 0,
            bounds: None,
        });
    }

    let (mut min_x, mut min_y) = (seed_x as u32, seed_y as u32);
    let (mut max_x, mut max_y) = (min_x, min_y);
    let mut filled = 0usize;

    // Pixels are recoloured when pushed, so they stop matching `target` and
    // are never pushed twice.  Flat indices keep the stack compact.
    let mut stack: Vec<u32> = Vec::with_capacity(4096);
    set(raw, seed_idx, fill);
    stack.push(seed_idx as u32);

    while let Some(idx) = stack.pop() {
        let idx = idx as usize;
        let x = (idx % wu) as u32;
        let y = (idx / wu) as u32;
        filled += 1;

        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        let mut visit = |ni: usize, raw: &mut [u8]| {
            if pix(raw, ni) == target {
                set(raw, ni, fill);
                stack.push(ni as u32);
            }
        };
        if x + 1 < w {
            visit(idx + 1, raw);
        }
        if x > 0 {
            visit(idx - 1, raw);
        }
        if y + 1 < h {
            visit(idx + wu, raw);
        }
        if y > 0 {
            visit(idx - wu, raw);
        }
    }

    Ok(FillOutcome {
        filled,
        bounds: Some(Rect::from_min_max(
            pos2(min_x as f32, min_y as f32),
            pos2((max_x + 1) as f32, (max_y + 1) as f32),
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WALL: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn fills_transparent_buffer_completely() {
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        let outcome = flood_fill(&mut buf, 0, 0, "#ff0000").unwrap();
        assert_eq!(outcome.filled, 16);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(buf.get_pixel(x, y), RED);
            }
        }
        assert_eq!(
            outcome.bounds,
            Some(Rect::from_min_max(pos2(0.0, 0.0), pos2(4.0, 4.0)))
        );
    }

    #[test]
    fn refilling_is_a_no_op() {
        let mut buf = PixelBuffer::new(5, 3).unwrap();
        flood_fill(&mut buf, 2, 1, "#ff0000").unwrap();
        let before = buf.clone();
        let outcome = flood_fill(&mut buf, 4, 2, "#ff0000").unwrap();
        assert!(!outcome.changed());
        assert_eq!(buf, before);
    }

    #[test]
    fn does_not_leak_through_diagonal_gaps() {
        // Diagonal wall from (0,2) to (2,0) separates the top-left corner.
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        for (x, y) in [(0, 2), (1, 1), (2, 0)] {
            buf.put_pixel(x, y, WALL);
        }
        let outcome = flood_fill(&mut buf, 0, 0, "#ff0000").unwrap();
        assert_eq!(outcome.filled, 3);
        assert_eq!(buf.get_pixel(0, 0), RED);
        assert_eq!(buf.get_pixel(1, 0), RED);
        assert_eq!(buf.get_pixel(0, 1), RED);
        assert_eq!(buf.get_pixel(3, 3)[3], 0);
        assert_eq!(buf.get_pixel(2, 1)[3], 0);
    }

    #[test]
    fn matching_is_exact_on_all_channels() {
        let mut buf = PixelBuffer::new(3, 1).unwrap();
        // Same alpha, different color: blocks the fill.
        buf.put_pixel(1, 0, Rgba([1, 0, 0, 0]));
        let outcome = flood_fill(&mut buf, 0, 0, "#ff0000").unwrap();
        assert_eq!(outcome.filled, 1);
        assert_eq!(buf.get_pixel(2, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn fills_only_the_seed_region_of_an_opaque_mask() {
        let mut buf = PixelBuffer::new(6, 1).unwrap();
        for x in 0..3 {
            buf.put_pixel(x, 0, WALL);
        }
        flood_fill(&mut buf, 1, 0, "#ff0000").unwrap();
        for x in 0..3 {
            assert_eq!(buf.get_pixel(x, 0), RED);
        }
        for x in 3..6 {
            assert_eq!(buf.get_pixel(x, 0)[3], 0);
        }
    }

    #[test]
    fn out_of_bounds_seed_is_rejected_without_mutation() {
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 4)] {
            let err = flood_fill(&mut buf, x, y, "#ff0000").unwrap_err();
            assert!(matches!(err, MaskError::OutOfBoundsSeed { width: 4, height: 4, .. }));
        }
        assert_eq!(buf.on_pixel_count(), 0);
    }

    #[test]
    fn large_region_does_not_overflow_the_stack() {
        let mut buf = PixelBuffer::new(512, 512).unwrap();
        let outcome = flood_fill(&mut buf, 256, 256, "#00ff00").unwrap();
        assert_eq!(outcome.filled, 512 * 512);
    }
}
