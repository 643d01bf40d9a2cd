// ============================================================================
// MASK IMPORT / EXPORT — collapse arbitrary images to the two-state mask
// ============================================================================

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use rayon::prelude::*;

use crate::canvas::PixelBuffer;
use crate::components::colors::on_pixel;
use crate::error::MaskError;

/// Red-channel value a source pixel must exceed to become "on".
pub const ON_THRESHOLD: u8 = 125;

const EXPORT_ON: [u8; 4] = [255, 255, 255, 255];
const EXPORT_OFF: [u8; 4] = [0, 0, 0, 255];

/// Convert an arbitrary image into the canonical mask.
///
/// Pixels whose red channel exceeds [`ON_THRESHOLD`] become `on_color` at
/// alpha 255; all others become fully transparent `(0, 0, 0, 0)`.
pub fn import_mask(source: &RgbaImage, on_color: &str) -> Result<PixelBuffer, MaskError> {
    let mut out = source.clone();
    threshold_raw(&mut out, on_color);
    PixelBuffer::from_rgba_image(out)
}

/// Import `source` into an existing working buffer, stretching it to the
/// buffer's dimensions first when they differ.
pub fn import_mask_into(buffer: &mut PixelBuffer, source: &RgbaImage, on_color: &str) {
    let (w, h) = buffer.dimensions();
    let fitted = fit_to(source, w, h);
    let raw = buffer.raw_mut();
    raw.copy_from_slice(fitted.as_raw());
    threshold_raw(raw, on_color);
}

/// Render the mask as an opaque black/white raster: alpha > 0 → white, else black.
/// The working buffer is not modified.
pub fn export_mask(buffer: &PixelBuffer) -> PixelBuffer {
    let mut out = buffer.clone();
    out.raw_mut().par_chunks_mut(4).for_each(|px| {
        let value = if px[3] > 0 { EXPORT_ON } else { EXPORT_OFF };
        px.copy_from_slice(&value);
    });
    out
}

/// Borrow `source` unchanged when it already has the requested size,
/// otherwise resample it (bilinear, like drawing an image into a canvas).
pub fn fit_to(source: &RgbaImage, width: u32, height: u32) -> Cow<'_, RgbaImage> {
    if source.dimensions() == (width, height) {
        Cow::Borrowed(source)
    } else {
        crate::log_info!(
            "Resampling mask source {}×{} to {}×{}",
            source.width(),
            source.height(),
            width,
            height
        );
        Cow::Owned(imageops::resize(source, width, height, FilterType::Triangle))
    }
}

fn threshold_raw(raw: &mut [u8], on_color: &str) {
    let on = on_pixel(on_color).0;
    raw.par_chunks_mut(4).for_each(|px| {
        if px[0] > ON_THRESHOLD {
            px.copy_from_slice(&on);
        } else {
            px.copy_from_slice(&[0, 0, 0, 0]);
        }
    });
}
