//! Frame decoding utilities.

use image::ImageFormat;

use super::types::{CameraError, RasterFrame, Resolution};

/// Decode the bitmap a still-capture command wrote to stdout.
///
/// Handles any BMP variant the `image` crate reads (24-bit, 32-bit, palette)
/// by converting to packed RGB. Fails with [`CameraError::EmptyOutput`] on an
/// empty buffer and [`CameraError::Decode`] on anything that isn't a bitmap.
pub fn decode_bmp(bytes: &[u8]) -> Result<RasterFrame, CameraError> {
    if bytes.is_empty() {
        return Err(CameraError::EmptyOutput);
    }

    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Bmp)
        .map_err(|e| CameraError::Decode(e.to_string()))?
        .to_rgb8();
    let (width, height) = decoded.dimensions();

    RasterFrame::from_rgb(width, height, decoded.into_raw())
        .ok_or_else(|| CameraError::Decode("pixel buffer size mismatch".to_string()))
}

/// Reject frames that don't have the requested size.
///
/// Two frames are only comparable if they come from the same resolution, so
/// an off-size frame counts as a failed acquisition.
pub fn ensure_resolution(frame: RasterFrame, expected: Resolution) -> Result<RasterFrame, CameraError> {
    let actual = frame.resolution();
    if actual != expected {
        return Err(CameraError::DimensionMismatch { expected, actual });
    }
    Ok(frame)
}
