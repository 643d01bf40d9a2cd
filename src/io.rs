use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbaImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::MaskError;

/// Stem used when the background came from an inline `data:` URL and the
/// caller suggested no name.
pub const FALLBACK_EXPORT_STEM: &str = "mask-image";

/// Decode a background or mask source from disk into RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage, MaskError> {
    let img = image::open(path)?.to_rgba8();
    crate::log_info!(
        "Loaded {} ({}×{})",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(img)
}

/// Decode an in-memory encoded image (PNG, JPEG, WEBP, …) into RGBA.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, MaskError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Encode an image as PNG into memory.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, MaskError> {
    let mut bytes = Vec::new();
    write_png_to(image, &mut bytes)?;
    Ok(bytes)
}

/// Encode an image as PNG and write it to `path`.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<(), MaskError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_png_to(image, &mut writer)?;
    writer.flush()?;
    crate::log_info!(
        "Wrote {}×{} PNG to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

fn write_png_to<W: Write>(image: &RgbaImage, writer: W) -> Result<(), MaskError> {
    let encoder = PngEncoder::new(writer);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(())
}

/// Derive the export file stem from where the background image came from.
///
/// Inline `data:` sources have no name, so `suggested` is used (or
/// [`FALLBACK_EXPORT_STEM`] when it is empty).  Otherwise the last `/`
/// segment is taken up to its first `.`:
/// `https://host/img/cat.final.jpg` → `cat`.
pub fn export_file_stem(background_source: &str, suggested: &str) -> String {
    if background_source.starts_with("data:") {
        return if suggested.is_empty() {
            FALLBACK_EXPORT_STEM.to_string()
        } else {
            suggested.to_string()
        };
    }
    let segment = background_source
        .rsplit('/')
        .next()
        .unwrap_or(background_source);
    segment.split('.').next().unwrap_or(segment).to_string()
}

/// [`export_file_stem`] with the `.png` extension appended.
pub fn export_file_name(background_source: &str, suggested: &str) -> String {
    format!("{}.png", export_file_stem(background_source, suggested))
}

/// Full export path inside `dir`.
pub fn export_path(dir: &Path, background_source: &str, suggested: &str) -> PathBuf {
    dir.join(export_file_name(background_source, suggested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn stem_from_url_path() {
        assert_eq!(export_file_stem("https://example.org/a/b/cat.jpg", ""), "cat");
        assert_eq!(export_file_stem("/images/scan.final.png", "x"), "scan");
        assert_eq!(export_file_stem("plain", ""), "plain");
    }

    #[test]
    fn stem_from_data_url() {
        assert_eq!(export_file_stem("data:image/png;base64,AAAA", ""), "mask-image");
        assert_eq!(export_file_stem("data:image/png;base64,AAAA", "lungs"), "lungs");
        assert_eq!(export_file_name("data:,", "lungs"), "lungs.png");
    }

    #[test]
    fn png_bytes_decode_back() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode_image(&bytes).unwrap(), img);
    }

    #[test]
    fn write_png_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_path(dir.path(), "https://x/y/photo.jpeg", "");
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        write_png(&img, &path).unwrap();
        assert!(path.ends_with("photo.png"));
        assert_eq!(load_image(&path).unwrap(), img);
    }

    #[test]
    fn decoding_garbage_is_an_error() {
        assert!(matches!(decode_image(b"not an image"), Err(MaskError::Image(_))));
    }
}
