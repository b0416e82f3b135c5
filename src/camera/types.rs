//! Camera types and data structures.

use std::fmt;
use std::time::Duration;

/// Capture resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in a frame of this size.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded test frame.
///
/// Pixel data is packed RGB, row-major, 3 bytes per pixel. Only the green
/// channel takes part in motion comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RasterFrame {
    /// Bytes per packed RGB pixel.
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Wrap packed RGB bytes. Returns `None` if the buffer length does not
    /// match the dimensions.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// A frame where every pixel has the same color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let data = rgb.iter().copied().cycle().take(pixels * 3).collect();
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Green intensity at (x, y).
    ///
    /// # Panics
    /// Panics if the coordinate is outside the frame.
    pub fn green(&self, x: u32, y: u32) -> u8 {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.data[self.offset(x, y) + 1]
    }

    /// Overwrite the RGB value at (x, y).
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let offset = self.offset(x, y);
        self.data[offset..offset + 3].copy_from_slice(&rgb);
    }

    /// Iterate over every pixel's green value in row-major order.
    pub fn greens(&self) -> impl Iterator<Item = u8> + '_ {
        self.data.chunks_exact(Self::BYTES_PER_PIXEL).map(|px| px[1])
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL
    }
}

/// Errors from the external still-capture command.
///
/// Every variant means "this capture failed"; callers decide whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("capture command '{0}' not found")]
    CommandNotFound(String),

    #[error("failed to run capture command: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("capture command exited with code {code:?}: {stderr}")]
    ProcessFailed { code: Option<i32>, stderr: String },

    #[error("capture command produced no image data")]
    EmptyOutput,

    #[error("capture command did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("could not decode test frame: {0}")]
    Decode(String),

    #[error("expected a {expected} frame, camera returned {actual}")]
    DimensionMismatch {
        expected: Resolution,
        actual: Resolution,
    },
}
