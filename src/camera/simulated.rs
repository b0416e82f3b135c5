//! Camera stand-in for dry runs.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::provider::CaptureProvider;
use super::types::{CameraError, RasterFrame, Resolution};

/// Synthesizes test frames and pretends to save stills.
///
/// Every `motion_every`-th frame has a bright block painted over a quarter of
/// the image, so a run exercises both the idle and the triggered branch of the
/// loop. No process is spawned and no file is written.
#[derive(Debug)]
pub struct SimulatedCamera {
    motion_every: u64,
    frames: AtomicU64,
    stills: AtomicU64,
}

impl SimulatedCamera {
    pub fn new(motion_every: u64) -> Self {
        Self {
            motion_every: motion_every.max(1),
            frames: AtomicU64::new(0),
            stills: AtomicU64::new(0),
        }
    }

    /// Test frames handed out so far.
    pub fn frames_captured(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    /// Stills "taken" so far.
    pub fn stills_captured(&self) -> u64 {
        self.stills.load(Ordering::SeqCst)
    }

    fn synthesize(&self, index: u64, resolution: Resolution) -> RasterFrame {
        let mut frame = RasterFrame::filled(resolution.width, resolution.height, [40, 40, 40]);
        if index > 0 && index % self.motion_every == 0 {
            for y in 0..resolution.height / 2 {
                for x in 0..resolution.width / 2 {
                    frame.set_pixel(x, y, [220, 220, 220]);
                }
            }
        }
        frame
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl CaptureProvider for SimulatedCamera {
    async fn capture_frame(
        &self,
        resolution: Resolution,
        _timeout: Duration,
    ) -> Result<RasterFrame, CameraError> {
        let index = self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(self.synthesize(index, resolution))
    }

    async fn capture_still(
        &self,
        resolution: Resolution,
        path: &Path,
        _timeout: Duration,
    ) -> Result<(), CameraError> {
        self.stills.fetch_add(1, Ordering::SeqCst);
        log::info!("[dry-run] would capture {} still to {}", resolution, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_motion_frames_appear_periodically() {
        let camera = SimulatedCamera::new(3);
        let res = Resolution::new(8, 6);
        let mut frames = Vec::new();
        for _ in 0..4 {
            frames.push(camera.capture_frame(res, Duration::ZERO).await.unwrap());
        }
        assert_eq!(frames[0], frames[1]);
        assert_eq!(frames[1], frames[2]);
        assert_ne!(frames[2], frames[3]);
        assert_eq!(frames[3].green(0, 0), 220);
        assert_eq!(frames[3].green(7, 5), 40);
        assert_eq!(camera.frames_captured(), 4);
    }

    #[tokio::test]
    async fn test_capture_still_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motion-20261019-140322.jpg");
        let camera = SimulatedCamera::default();
        camera
            .capture_still(Resolution::new(1280, 960), &path, Duration::ZERO)
            .await
            .unwrap();
        assert!(!path.exists());
        assert_eq!(camera.stills_captured(), 1);
    }
}
