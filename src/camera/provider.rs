//! The capture capability the motion loop depends on.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{CameraError, RasterFrame, Resolution};

/// Something that can take pictures.
///
/// The real implementation shells out to a still-capture command; the dry-run
/// implementation synthesizes frames and writes nothing. Implementations never
/// retry; that is the caller's job.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Grab a small frame for motion comparison.
    async fn capture_frame(
        &self,
        resolution: Resolution,
        timeout: Duration,
    ) -> Result<RasterFrame, CameraError>;

    /// Take a full-resolution JPEG and write it to `path`.
    async fn capture_still(
        &self,
        resolution: Resolution,
        path: &Path,
        timeout: Duration,
    ) -> Result<(), CameraError>;
}
