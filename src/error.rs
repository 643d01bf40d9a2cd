use std::fmt;

/// Errors surfaced by the mask engine.
///
/// Malformed colors and undo on an empty history are deliberately absent: the
/// former falls back to black, the latter is reported as "nothing changed".
#[derive(Debug)]
pub enum MaskError {
    /// Zoom scale was zero, negative or not finite.
    InvalidScale(f32),
    /// Flood-fill seed lies outside `[0, width) × [0, height)`.
    OutOfBoundsSeed {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    /// Zero-sized buffer, or raw sample data whose length is not `width * height * 4`.
    InvalidDimensions { width: u32, height: u32 },
    Io(std::io::Error),
    Image(image::ImageError),
}

impl fmt::Display for MaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskError::InvalidScale(s) => write!(f, "Invalid zoom scale: {} (must be > 0)", s),
            MaskError::OutOfBoundsSeed {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "Fill seed ({}, {}) outside {}×{} buffer",
                x, y, width, height
            ),
            MaskError::InvalidDimensions { width, height } => {
                write!(f, "Invalid buffer dimensions {}×{}", width, height)
            }
            MaskError::Io(e) => write!(f, "I/O error: {}", e),
            MaskError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for MaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MaskError::Io(e) => Some(e),
            MaskError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MaskError {
    fn from(e: std::io::Error) -> Self {
        MaskError::Io(e)
    }
}

impl From<image::ImageError> for MaskError {
    fn from(e: image::ImageError) -> Self {
        MaskError::Image(e)
    }
}
