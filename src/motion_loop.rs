//! The acquire → compare → capture → publish cycle.

use std::path::Path;
use std::time::Duration;

use crate::camera::{CaptureProvider, RasterFrame, Resolution, SimulatedCamera};
use crate::config::Config;
use crate::motion::MotionDetector;
use crate::persist::CapturePersister;
use crate::retry::{acquire_until_success, publish_with_backoff, PublishOutcome, RetryState};
use crate::shutdown::Shutdown;
use crate::social::{DryRunPublisher, Publisher};
use crate::storage::{DiskBudgetKeeper, UnlimitedProbe};

/// Timing and sizing the loop itself needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub test_resolution: Resolution,
    pub test_timeout: Duration,
    /// Fixed pause between failed frame acquisitions.
    pub acquire_pause: Duration,
    /// First wait after a failed publish.
    pub base_wait: Duration,
}

impl From<&Config> for LoopSettings {
    fn from(config: &Config) -> Self {
        Self {
            test_resolution: config.motion.test_resolution(),
            test_timeout: config.camera.test_timeout(),
            acquire_pause: config.camera.acquire_retry_delay(),
            base_wait: config.publish.base_wait(),
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Frame pairs compared.
    pub iterations: u64,
    pub triggers: u64,
    pub captures: u64,
    pub capture_failures: u64,
    pub publishes: u64,
    /// Failed publish attempts, including ones later retried successfully.
    pub publish_failures: u64,
    /// Captures given up on because the file could not be read.
    pub abandoned_publishes: u64,
}

/// Drives a camera, a motion detector and a publisher.
///
/// Exactly two test frames are alive at any point. The previous frame is
/// replaced by the current one after each comparison, whatever happened in
/// between. While a publish is being retried the loop does not advance.
pub struct MotionLoop<C, P> {
    settings: LoopSettings,
    detector: MotionDetector,
    camera: C,
    persister: CapturePersister,
    publisher: P,
    shutdown: Shutdown,
    retry: RetryState,
}

impl<C: CaptureProvider, P: Publisher> MotionLoop<C, P> {
    pub fn new(
        settings: LoopSettings,
        detector: MotionDetector,
        camera: C,
        persister: CapturePersister,
        publisher: P,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            settings,
            detector,
            camera,
            persister,
            publisher,
            shutdown,
            retry: RetryState::default(),
        }
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn retry_state(&self) -> RetryState {
        self.retry
    }

    /// Run until shutdown, or for `max_iterations` comparisons if given.
    pub async fn run(&mut self, max_iterations: Option<u64>) -> LoopReport {
        let mut report = LoopReport::default();

        let Some(mut previous) = self.acquire().await else {
            return report;
        };

        while max_iterations.map_or(true, |max| report.iterations < max) {
            let Some(current) = self.acquire().await else {
                break;
            };
            report.iterations += 1;

            let changed = self.detector.compare(&previous, &current);
            log::debug!(
                "Iteration {}: {} changed pixels",
                report.iterations,
                changed
            );

            if self.detector.is_triggered(changed) {
                report.triggers += 1;
                log::info!(
                    "Motion detected: {} changed pixels (sensitivity {})",
                    changed,
                    self.detector.sensitivity()
                );
                self.on_trigger(&mut report).await;
            }

            previous = current;

            if self.shutdown.is_cancelled() {
                break;
            }
        }

        log::info!(
            "Stopped after {} iterations: {} triggers, {} captures, {} posts",
            report.iterations,
            report.triggers,
            report.captures,
            report.publishes
        );
        report
    }

    async fn acquire(&self) -> Option<RasterFrame> {
        acquire_until_success(
            &self.camera,
            self.settings.test_resolution,
            self.settings.test_timeout,
            self.settings.acquire_pause,
            &self.shutdown,
        )
        .await
    }

    async fn on_trigger(&mut self, report: &mut LoopReport) {
        let path = match self.persister.capture_and_save(&self.camera).await {
            Ok(path) => path,
            Err(e) => {
                report.capture_failures += 1;
                log::warn!("Capture failed, skipping this trigger: {}", e);
                return;
            }
        };
        report.captures += 1;

        let outcome = publish_with_backoff(
            &self.publisher,
            &path,
            self.settings.base_wait,
            &mut self.retry,
            &self.shutdown,
        )
        .await;

        match outcome {
            PublishOutcome::Published { failures, .. } => {
                report.publishes += 1;
                report.publish_failures += u64::from(failures);
            }
            PublishOutcome::Abandoned { failures } => {
                report.abandoned_publishes += 1;
                report.publish_failures += u64::from(failures);
            }
            PublishOutcome::Cancelled { failures } => {
                report.publish_failures += u64::from(failures);
            }
        }
    }
}

impl MotionLoop<SimulatedCamera, DryRunPublisher> {
    /// A loop that spawns no process, writes no file and posts nothing.
    pub fn dry_run(config: &Config, dir: &Path, shutdown: Shutdown) -> Self {
        let persister = CapturePersister::new(
            dir,
            config.camera.save_resolution(),
            config.camera.save_timeout(),
            // Nothing is written, so nothing may be deleted either
            0,
            DiskBudgetKeeper::new(UnlimitedProbe),
        );
        Self::new(
            LoopSettings::from(config),
            MotionDetector::from(&config.motion),
            SimulatedCamera::default(),
            persister,
            DryRunPublisher::new(),
            shutdown,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_default_config() {
        let settings = LoopSettings::from(&Config::default());
        assert_eq!(settings.test_resolution, Resolution::new(100, 75));
        assert_eq!(settings.test_timeout, Duration::from_millis(200));
        assert_eq!(settings.acquire_pause, Duration::from_millis(100));
        assert_eq!(settings.base_wait, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_dry_run_stops_after_iterations() {
        let dir = tempfile::tempdir().unwrap();
        let mut motion_loop = MotionLoop::dry_run(&Config::default(), dir.path(), Shutdown::new());

        let report = motion_loop.run(Some(6)).await;

        assert_eq!(report.iterations, 6);
        // Frames 3 and 6 are bright: pairs (2,3), (3,4), (5,6) differ
        assert_eq!(report.triggers, 3);
        assert_eq!(report.captures, 3);
        assert_eq!(report.publishes, 3);
        assert_eq!(motion_loop.camera().frames_captured(), 7);
        assert_eq!(motion_loop.camera().stills_captured(), 3);
        assert_eq!(motion_loop.publisher().published(), 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_works_without_a_real_directory() {
        let dir = Path::new("/nonexistent/motion-captures");
        let mut motion_loop = MotionLoop::dry_run(&Config::default(), dir, Shutdown::new());

        let report = motion_loop.run(Some(3)).await;

        assert_eq!(report.captures, report.triggers);
        assert_eq!(report.capture_failures, 0);
        let reclaim = motion_loop.persister.keeper().ensure_free(dir, u64::MAX).unwrap();
        assert!(reclaim.satisfied);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let shutdown = Shutdown::new();
        shutdown.cancel();
        let mut motion_loop = MotionLoop::dry_run(&Config::default(), dir.path(), shutdown);

        let report = motion_loop.run(None).await;

        assert_eq!(report, LoopReport::default());
        assert_eq!(motion_loop.camera().frames_captured(), 0);
    }
}
