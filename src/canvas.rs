use egui::{Pos2, Rect, Vec2, pos2};
use image::{Rgba, RgbaImage};

use crate::error::MaskError;

/// Fully transparent "off" pixel.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Upper bound on buffer area (~256 megapixels).
pub const MAX_PIXELS: u64 = 256_000_000;

/// Zoom levels offered by the scale picker.  Any positive scale is accepted.
pub const ZOOM_PRESETS: [f32; 4] = [0.25, 0.5, 0.75, 1.0];

// ============================================================================
// PIXEL BUFFER
// ============================================================================

/// A rectangular grid of RGBA samples — the working mask or a copy of it.
///
/// Dimensions are fixed once allocated; loading a background of a different
/// size replaces the buffer wholesale instead of resizing it in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: RgbaImage,
}

impl PixelBuffer {
    /// Allocate a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, MaskError> {
        check_dimensions(width, height)?;
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
        })
    }

    /// Take ownership of an already-decoded RGBA image.
    pub fn from_rgba_image(pixels: RgbaImage) -> Result<Self, MaskError> {
        check_dimensions(pixels.width(), pixels.height())?;
        Ok(Self { pixels })
    }

    /// Wrap a flat `R,G,B,A` sample vector of length `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, MaskError> {
        check_dimensions(width, height)?;
        let pixels = RgbaImage::from_raw(width, height, data)
            .ok_or(MaskError::InvalidDimensions { width, height })?;
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Whether a (possibly negative) integer coordinate addresses a pixel.
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    /// Panics when `(x, y)` is outside the buffer, like `RgbaImage::get_pixel`.
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
        self.pixels.put_pixel(x, y, pixel);
    }

    /// Flat sample slice, row-major, 4 bytes per pixel.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub(crate) fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Make every pixel fully transparent.
    pub fn clear(&mut self) {
        self.raw_mut().fill(0);
    }

    /// Overwrite this buffer with `other`.  Same-sized buffers are copied in
    /// place; otherwise the allocation is replaced.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        if self.dimensions() == other.dimensions() {
            self.raw_mut().copy_from_slice(other.as_raw());
        } else {
            self.pixels = other.pixels.clone();
        }
    }

    /// Number of "on" pixels (alpha > 0).
    pub fn on_pixel_count(&self) -> usize {
        self.as_raw().chunks_exact(4).filter(|p| p[3] > 0).count()
    }

    pub fn memory_bytes(&self) -> usize {
        self.as_raw().len()
    }

    /// The whole buffer as a rect in buffer space.
    pub fn bounds(&self) -> Rect {
        Rect::from_min_max(
            Pos2::ZERO,
            pos2(self.width() as f32, self.height() as f32),
        )
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), MaskError> {
    let total = width as u64 * height as u64;
    if width == 0 || height == 0 || total > MAX_PIXELS {
        crate::log_warn!("Rejected buffer dimensions {}×{}", width, height);
        return Err(MaskError::InvalidDimensions { width, height });
    }
    Ok(())
}

// ============================================================================
// VIEWPORT (display space ↔ buffer space)
// ============================================================================

/// Where the buffer sits on screen and how far it is zoomed.
///
/// `buffer = (display - origin) / scale`.  The scale is validated on every
/// write, so a `Viewport` can never divide by zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    origin: Pos2,
    scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Pos2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(origin: Pos2, scale: f32) -> Result<Self, MaskError> {
        Ok(Self {
            origin,
            scale: validate_scale(scale)?,
        })
    }

    pub fn origin(&self) -> Pos2 {
        self.origin
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_origin(&mut self, origin: Pos2) {
        self.origin = origin;
    }

    pub fn set_scale(&mut self, scale: f32) -> Result<(), MaskError> {
        self.scale = validate_scale(scale)?;
        Ok(())
    }

    /// Map a pointer position to (sub-pixel) buffer coordinates.
    pub fn to_buffer_space(&self, display: Pos2) -> Pos2 {
        ((display - self.origin) / self.scale).to_pos2()
    }

    /// Inverse of [`Viewport::to_buffer_space`]; used for cursor overlays.
    pub fn to_display_space(&self, buffer: Pos2) -> Pos2 {
        self.origin + buffer.to_vec2() * self.scale
    }

    /// On-screen footprint of a `width × height` buffer.
    pub fn display_rect(&self, width: u32, height: u32) -> Rect {
        Rect::from_min_size(
            self.origin,
            Vec2::new(width as f32, height as f32) * self.scale,
        )
    }
}

/// Reject zero, negative and non-finite zoom scales.
pub fn validate_scale(scale: f32) -> Result<f32, MaskError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        crate::log_err!("Rejected zoom scale {}", scale);
        Err(MaskError::InvalidScale(scale))
    }
}

/// `((display - origin) / scale)` per axis, validating `scale` first.
pub fn to_buffer_space(display: Pos2, origin: Pos2, scale: f32) -> Result<Pos2, MaskError> {
    Ok(Viewport::new(origin, scale)?.to_buffer_space(display))
}

/// Quantize a sub-pixel position to the pixel that contains it (floor).
pub fn pixel_coord(pos: Pos2) -> (i64, i64) {
    (pos.x.floor() as i64, pos.y.floor() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Pos2, b: Pos2) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn new_buffer_is_transparent() {
        let buf = PixelBuffer::new(3, 2).unwrap();
        assert_eq!(buf.dimensions(), (3, 2));
        assert_eq!(buf.as_raw().len(), 3 * 2 * 4);
        assert!(buf.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_sized_buffer_is_rejected() {
        assert!(matches!(
            PixelBuffer::new(0, 5),
            Err(MaskError::InvalidDimensions { width: 0, height: 5 })
        ));
    }

    #[test]
    fn raw_data_must_match_dimensions() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_err());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn copy_from_replaces_differently_sized_buffer() {
        let mut a = PixelBuffer::new(2, 2).unwrap();
        let mut b = PixelBuffer::new(4, 1).unwrap();
        b.put_pixel(3, 0, Rgba([1, 2, 3, 4]));
        a.copy_from(&b);
        assert_eq!(a, b);
    }

    #[test]
    fn in_bounds_handles_negative_coordinates() {
        let buf = PixelBuffer::new(4, 4).unwrap();
        assert!(buf.in_bounds(0, 3));
        assert!(!buf.in_bounds(-1, 0));
        assert!(!buf.in_bounds(4, 0));
    }

    #[test]
    fn mapping_divides_by_scale() {
        let vp = Viewport::new(pos2(10.0, 20.0), 0.5).unwrap();
        assert!(approx(vp.to_buffer_space(pos2(14.0, 21.0)), pos2(8.0, 2.0)));
    }

    #[test]
    fn mapping_is_linear() {
        for &s in &[0.25f32, 0.5, 0.75, 1.0, 3.3] {
            let (ox, oy) = (17.5f32, -4.0f32);
            let (dx, dy) = (12.0f32, 7.25f32);
            let got = to_buffer_space(pos2(ox + s * dx, oy + s * dy), pos2(ox, oy), s).unwrap();
            assert!(approx(got, pos2(dx, dy)), "scale {s}: {got:?}");
        }
    }

    #[test]
    fn display_space_round_trips() {
        let vp = Viewport::new(pos2(3.0, 5.0), 0.75).unwrap();
        let p = pos2(40.0, 12.0);
        assert!(approx(vp.to_buffer_space(vp.to_display_space(p)), p));
    }

    #[test]
    fn zero_and_negative_scale_are_rejected() {
        assert!(matches!(
            to_buffer_space(Pos2::ZERO, Pos2::ZERO, 0.0),
            Err(MaskError::InvalidScale(_))
        ));
        assert!(Viewport::new(Pos2::ZERO, -1.0).is_err());
        assert!(Viewport::new(Pos2::ZERO, f32::NAN).is_err());

        let mut vp = Viewport::default();
        assert!(vp.set_scale(0.0).is_err());
        assert_eq!(vp.scale(), 1.0);
    }

    #[test]
    fn pixel_coord_floors() {
        assert_eq!(pixel_coord(pos2(2.9, 0.1)), (2, 0));
        assert_eq!(pixel_coord(pos2(-0.5, 3.0)), (-1, 3));
    }
}
