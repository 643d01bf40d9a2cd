// ============================================================================
// MASK FILTERS — Gaussian smoothing, skeleton thinning
// ============================================================================

use rayon::prelude::*;

use crate::canvas::PixelBuffer;
use crate::components::colors::on_pixel;

/// Blur radius used by [`smooth_mask`].
pub const SMOOTH_SIGMA: f32 = 1.0;

/// Smoothed coverage a pixel needs to stay "on" after [`smooth_mask`].
pub const SMOOTH_THRESHOLD: f32 = 0.1;

/// Whole-mask clean-up operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskFilter {
    Smooth,
    Thin,
    SmoothThinSmooth,
}

impl MaskFilter {
    pub fn label(&self) -> &'static str {
        match self {
            MaskFilter::Smooth => "Smooth",
            MaskFilter::Thin => "Thin",
            MaskFilter::SmoothThinSmooth => "Smooth-Thin-Smooth",
        }
    }

    pub fn all() -> &'static [MaskFilter] {
        &[
            MaskFilter::Smooth,
            MaskFilter::Thin,
            MaskFilter::SmoothThinSmooth,
        ]
    }

    pub fn apply(&self, buffer: &mut PixelBuffer, on_color: &str) {
        match self {
            MaskFilter::Smooth => smooth_mask(buffer, on_color),
            MaskFilter::Thin => thin_mask(buffer, on_color),
            MaskFilter::SmoothThinSmooth => smooth_thin_smooth(buffer, on_color),
        }
    }
}

/// Blur the binary mask (σ = 1) and keep every pixel whose smoothed coverage
/// exceeds [`SMOOTH_THRESHOLD`].  Rounds jagged edges and closes pinholes.
pub fn smooth_mask(buffer: &mut PixelBuffer, on_color: &str) {
    let (w, h) = buffer.dimensions();
    let coverage = binary_coverage(buffer);
    let blurred = gaussian_blur_plane(&coverage, w as usize, h as usize, SMOOTH_SIGMA);
    let on: Vec<bool> = blurred.par_iter().map(|&v| v > SMOOTH_THRESHOLD).collect();
    write_binary(buffer, &on, on_color);
}

/// Reduce the mask to a one-pixel-wide skeleton (two-subiteration thinning).
pub fn thin_mask(buffer: &mut PixelBuffer, on_color: &str) {
    let (w, h) = buffer.dimensions();
    let mut on: Vec<bool> = buffer.as_raw().chunks_exact(4).map(|p| p[3] > 0).collect();
    thin_plane(&mut on, w as usize, h as usize);
    write_binary(buffer, &on, on_color);
}

/// Smooth twice, thin, then smooth four more times.
pub fn smooth_thin_smooth(buffer: &mut PixelBuffer, on_color: &str) {
    for _ in 0..2 {
        smooth_mask(buffer, on_color);
    }
    thin_mask(buffer, on_color);
    for _ in 0..4 {
        smooth_mask(buffer, on_color);
    }
}

fn binary_coverage(buffer: &PixelBuffer) -> Vec<f32> {
    buffer
        .as_raw()
        .par_chunks_exact(4)
        .map(|p| if p[3] > 0 { 1.0 } else { 0.0 })
        .collect()
}

fn write_binary(buffer: &mut PixelBuffer, on: &[bool], on_color: &str) {
    let on_px = on_pixel(on_color).0;
    buffer
        .raw_mut()
        .par_chunks_mut(4)
        .zip(on.par_iter())
        .for_each(|(px, &is_on)| {
            px.copy_from_slice(if is_on { &on_px } else { &[0, 0, 0, 0] });
        });
}

/// Kernel support in standard deviations.
const KERNEL_TRUNCATE: f32 = 4.0;

fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * KERNEL_TRUNCATE).ceil() as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..len)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Separable Gaussian blur of a single f32 plane, edges clamped.
/// Both passes are parallel by row.
fn gaussian_blur_plane(src: &[f32], w: usize, h: usize, sigma: f32) -> Vec<f32> {
    if w == 0 || h == 0 {
        return src.to_vec();
    }
    let kernel = build_gaussian_kernel(sigma);
    let radius = kernel.len() / 2;

    // --- Horizontal pass ---
    let mut buf_h = vec![0.0f32; w * h];
    buf_h.par_chunks_mut(w).enumerate().for_each(|(y, row_out)| {
        let row_in = &src[y * w..(y + 1) * w];
        for (x, out) in row_out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius as isize).clamp(0, w as isize - 1);
                acc += row_in[sx as usize] * kv;
            }
            *out = acc;
        }
    });

    // --- Vertical pass ---
    let mut buf_v = vec![0.0f32; w * h];
    buf_v.par_chunks_mut(w).enumerate().for_each(|(y, row_out)| {
        for (x, out) in row_out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius as isize).clamp(0, h as isize - 1);
                acc += buf_h[sy as usize * w + x] * kv;
            }
            *out = acc;
        }
    });

    buf_v
}

/// Guo–Hall thinning.  Pixels outside the plane count as "off".
fn thin_plane(on: &mut [bool], w: usize, h: usize) {
    let at = |grid: &[bool], x: isize, y: isize| -> u8 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0
        } else {
            grid[y as usize * w + x as usize] as u8
        }
    };

    let mut remove = Vec::new();
    loop {
        let mut changed = false;
        for pass in 0..2 {
            remove.clear();
            let grid: &[bool] = on;
            for y in 0..h {
                for x in 0..w {
                    if !grid[y * w + x] {
                        continue;
                    }
                    let (xi, yi) = (x as isize, y as isize);
                    // Clockwise from north
                    let p2 = at(grid, xi, yi - 1);
                    let p3 = at(grid, xi + 1, yi - 1);
                    let p4 = at(grid, xi + 1, yi);
                    let p5 = at(grid, xi + 1, yi + 1);
                    let p6 = at(grid, xi, yi + 1);
                    let p7 = at(grid, xi - 1, yi + 1);
                    let p8 = at(grid, xi - 1, yi);
                    let p9 = at(grid, xi - 1, yi - 1);

                    let c = ((1 - p2) & (p3 | p4))
                        + ((1 - p4) & (p5 | p6))
                        + ((1 - p6) & (p7 | p8))
                        + ((1 - p8) & (p9 | p2));
                    if c != 1 {
                        continue;
                    }
                    let n1 = (p9 | p2) + (p3 | p4) + (p5 | p6) + (p7 | p8);
                    let n2 = (p2 | p3) + (p4 | p5) + (p6 | p7) + (p8 | p9);
                    let n = n1.min(n2);
                    if !(2..=3).contains(&n) {
                        continue;
                    }
                    let m = if pass == 0 {
                        (p6 | p7 | (1 - p9)) & p8
                    } else {
                        (p2 | p3 | (1 - p5)) & p4
                    };
                    if m == 0 {
                        remove.push(y * w + x);
                    }
                }
            }
            for &idx in &remove {
                on[idx] = false;
            }
            changed |= !remove.is_empty();
        }
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn rect_mask(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(w, h).unwrap();
        for y in y0..=y1 {
            for x in x0..=x1 {
                buf.put_pixel(x, y, Rgba([255, 255, 0, 255]));
            }
        }
        buf
    }

    #[test]
    fn kernel_is_normalised() {
        let k = build_gaussian_kernel(1.0);
        assert_eq!(k.len(), 9);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(k[4] > k[3] && k[3] > k[2] && k[2] > k[1] && k[1] > k[0]);
        assert_eq!(k[0], k[8]);
    }

    #[test]
    fn smoothing_fills_a_pinhole() {
        let mut buf = rect_mask(9, 9, 1, 1, 7, 7);
        buf.put_pixel(4, 4, Rgba([0, 0, 0, 0]));
        smooth_mask(&mut buf, "#ff0000");
        assert_eq!(buf.get_pixel(4, 4), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn smoothing_keeps_a_lone_pixel_alone() {
        // σ=1 blur of one pixel: centre ≈ 0.159, axis neighbours ≈ 0.097.
        let mut buf = PixelBuffer::new(11, 11).unwrap();
        buf.put_pixel(5, 5, Rgba([255, 255, 0, 255]));
        smooth_mask(&mut buf, "#ffff00");
        assert_eq!(buf.on_pixel_count(), 1);
        assert_eq!(buf.get_pixel(5, 5)[3], 255);
    }

    #[test]
    fn smoothing_keeps_empty_mask_empty() {
        let mut buf = PixelBuffer::new(6, 6).unwrap();
        smooth_mask(&mut buf, "#ff0000");
        assert_eq!(buf.on_pixel_count(), 0);
    }

    #[test]
    fn smoothing_output_is_binary() {
        let mut buf = rect_mask(12, 12, 3, 3, 6, 8);
        smooth_mask(&mut buf, "#00ff00");
        for p in buf.as_raw().chunks_exact(4) {
            assert!(*p == [0, 255, 0, 255] || *p == [0, 0, 0, 0]);
        }
    }

    #[test]
    fn thinning_reduces_a_bar_to_one_pixel_line() {
        let mut buf = rect_mask(11, 5, 1, 1, 9, 3);
        let before = buf.clone();
        thin_mask(&mut buf, "#ffffff");
        assert!(buf.on_pixel_count() > 0);
        assert!(buf.on_pixel_count() < before.on_pixel_count());
        for x in 3..=7 {
            let column: Vec<u32> = (0..5).filter(|&y| buf.get_pixel(x, y)[3] > 0).collect();
            assert_eq!(column, vec![2], "column {x}");
        }
        // Skeleton never grows outside the original shape.
        for y in 0..5 {
            for x in 0..11 {
                if buf.get_pixel(x, y)[3] > 0 {
                    assert!(before.get_pixel(x, y)[3] > 0);
                }
            }
        }
    }

    #[test]
    fn thinning_keeps_a_lone_line() {
        let mut buf = rect_mask(8, 3, 1, 1, 6, 1);
        let before = buf.clone();
        thin_mask(&mut buf, "#ffff00");
        assert_eq!(buf, before);
    }

    #[test]
    fn filter_list_dispatches() {
        let mut buf = rect_mask(10, 10, 2, 2, 7, 7);
        for f in MaskFilter::all() {
            f.apply(&mut buf, "#ffff00");
        }
        assert!(buf.on_pixel_count() > 0);
    }
}
