//! Still-capture command wrapper (raspistill and compatible tools).

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::frame_utils::{decode_bmp, ensure_resolution};
use super::provider::CaptureProvider;
use super::types::{CameraError, RasterFrame, Resolution};
use crate::config::CameraConfig;

/// Settings for the external capture command.
#[derive(Debug, Clone)]
pub struct StillSettings {
    /// Executable name or path
    pub command: String,
    /// JPEG quality for full-resolution captures (0-100)
    pub jpeg_quality: u8,
    /// Kill the command if it runs longer than this
    pub process_timeout: Duration,
}

impl Default for StillSettings {
    fn default() -> Self {
        let config = CameraConfig::default();
        Self::from(&config)
    }
}

impl From<&CameraConfig> for StillSettings {
    fn from(config: &CameraConfig) -> Self {
        Self {
            command: config.command.clone(),
            jpeg_quality: config.jpeg_quality,
            process_timeout: config.process_timeout(),
        }
    }
}

/// Camera backed by an external still-capture command.
///
/// Each call runs one command to completion; the command owns the camera
/// device for that duration, so calls must not overlap.
#[derive(Debug, Clone)]
pub struct StillCamera {
    settings: StillSettings,
}

impl StillCamera {
    pub fn new(settings: StillSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &StillSettings {
        &self.settings
    }

    /// Arguments for a bitmap test frame written to stdout.
    pub fn test_frame_args(resolution: Resolution, timeout: Duration) -> Vec<String> {
        vec![
            "-w".to_string(),
            resolution.width.to_string(),
            "-h".to_string(),
            resolution.height.to_string(),
            "-t".to_string(),
            timeout.as_millis().to_string(),
            "-e".to_string(),
            "bmp".to_string(),
            "-o".to_string(),
            "-".to_string(),
        ]
    }

    /// Arguments for a JPEG written straight to `path`.
    pub fn still_args(
        resolution: Resolution,
        timeout: Duration,
        quality: u8,
        path: &Path,
    ) -> Vec<String> {
        vec![
            "-w".to_string(),
            resolution.width.to_string(),
            "-h".to_string(),
            resolution.height.to_string(),
            "-t".to_string(),
            timeout.as_millis().to_string(),
            "-e".to_string(),
            "jpg".to_string(),
            "-q".to_string(),
            quality.to_string(),
            "-o".to_string(),
            path.display().to_string(),
        ]
    }

    /// Run the capture command and return its output if it exited with 0.
    async fn run(&self, args: &[String]) -> Result<Output, CameraError> {
        let mut cmd = Command::new(&self.settings.command);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.settings.process_timeout, cmd.output())
            .await
            .map_err(|_| CameraError::TimedOut(self.settings.process_timeout))?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CameraError::CommandNotFound(self.settings.command.clone())
                } else {
                    CameraError::SpawnFailed(e)
                }
            })?;

        if !output.status.success() {
            return Err(CameraError::ProcessFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl CaptureProvider for StillCamera {
    async fn capture_frame(
        &self,
        resolution: Resolution,
        timeout: Duration,
    ) -> Result<RasterFrame, CameraError> {
        let output = self.run(&Self::test_frame_args(resolution, timeout)).await?;
        let frame = decode_bmp(&output.stdout)?;
        ensure_resolution(frame, resolution)
    }

    async fn capture_still(
        &self,
        resolution: Resolution,
        path: &Path,
        timeout: Duration,
    ) -> Result<(), CameraError> {
        let args = Self::still_args(resolution, timeout, self.settings.jpeg_quality, path);
        self.run(&args).await.map(|_| ())
    }
}
