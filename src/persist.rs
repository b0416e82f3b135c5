//! Full-resolution capture to the capture directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

use crate::camera::{CameraError, CaptureProvider, Resolution};
use crate::storage::{capture_file_name, DiskBudgetKeeper};

/// Saves full-resolution stills as `dir/motion-<timestamp>.jpg`, freeing disk
/// space first.
#[derive(Debug)]
pub struct CapturePersister {
    dir: PathBuf,
    resolution: Resolution,
    timeout: Duration,
    reserve_bytes: u64,
    keeper: DiskBudgetKeeper,
}

impl CapturePersister {
    pub fn new(
        dir: impl Into<PathBuf>,
        resolution: Resolution,
        timeout: Duration,
        reserve_bytes: u64,
        keeper: DiskBudgetKeeper,
    ) -> Self {
        Self {
            dir: dir.into(),
            resolution,
            timeout,
            reserve_bytes,
            keeper,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn keeper(&self) -> &DiskBudgetKeeper {
        &self.keeper
    }

    /// Make room, then capture one still.
    ///
    /// The file name comes from the local wall clock at capture time; two
    /// captures in the same second share a name and the later one wins.
    /// Failing to make room is logged and the capture goes ahead anyway.
    pub async fn capture_and_save<C: CaptureProvider>(
        &self,
        camera: &C,
    ) -> Result<PathBuf, CameraError> {
        match self.keeper.ensure_free(&self.dir, self.reserve_bytes) {
            Ok(reclaim) if !reclaim.satisfied => log::warn!(
                "Capture directory {} is below its {} byte reserve",
                self.dir.display(),
                self.reserve_bytes
            ),
            Ok(_) => {}
            Err(e) => log::warn!(
                "Could not check free space in {}: {}",
                self.dir.display(),
                e
            ),
        }

        let path = self.dir.join(capture_file_name(&Local::now()));
        camera
            .capture_still(self.resolution, &path, self.timeout)
            .await?;
        log::info!("Captured {}", path.display());
        Ok(path)
    }
}
