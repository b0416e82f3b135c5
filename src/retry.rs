//! Retry sub-loops of the motion loop.
//!
//! Frame acquisition is retried forever after a short fixed pause. Publishing
//! is retried with an exponentially growing wait (`base × multiplier`, the
//! multiplier doubling after each failure and resetting on success). Both
//! give up only when shutdown is requested.

use std::path::Path;
use std::time::Duration;

use crate::camera::{CaptureProvider, RasterFrame, Resolution};
use crate::shutdown::Shutdown;
use crate::social::{PostRecord, Publisher};

/// Publish backoff state. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    multiplier: u32,
}

impl Default for RetryState {
    fn default() -> Self {
        Self { multiplier: 1 }
    }
}

impl RetryState {
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// The wait before the next attempt.
    pub fn wait(&self, base: Duration) -> Duration {
        base.saturating_mul(self.multiplier)
    }

    /// Record a failed attempt. The multiplier is uncapped but saturates.
    pub fn record_failure(&mut self) {
        self.multiplier = self.multiplier.saturating_mul(2);
    }

    pub fn reset(&mut self) {
        self.multiplier = 1;
    }
}

/// Outcome of [`publish_with_backoff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Posted after `failures` failed attempts.
    Published { post: PostRecord, failures: u32 },
    /// A non-retryable error ended the attempts.
    Abandoned { failures: u32 },
    /// Shutdown was requested while waiting.
    Cancelled { failures: u32 },
}

/// Capture a test frame, retrying after `pause` until one arrives.
///
/// Returns `None` only if shutdown is requested.
pub async fn acquire_until_success<C: CaptureProvider>(
    camera: &C,
    resolution: Resolution,
    timeout: Duration,
    pause: Duration,
    shutdown: &Shutdown,
) -> Option<RasterFrame> {
    let mut failures: u64 = 0;
    loop {
        if shutdown.is_cancelled() {
            return None;
        }
        match camera.capture_frame(resolution, timeout).await {
            Ok(frame) => {
                if failures > 0 {
                    log::info!("Frame acquired after {} failed attempts", failures);
                }
                return Some(frame);
            }
            Err(e) => {
                failures += 1;
                // Warn once per outage
                if failures == 1 {
                    log::warn!("Frame capture failed: {} (retrying)", e);
                } else {
                    log::debug!("Frame capture failed again ({}): {}", failures, e);
                }
                if !shutdown.sleep(pause).await {
                    return None;
                }
            }
        }
    }
}

/// Publish `path`, waiting `base × multiplier` between failed attempts.
///
/// The same file is retried each time. `state` is reset on success and when
/// the file is given up on, and left doubled on cancellation.
pub async fn publish_with_backoff<P: Publisher>(
    publisher: &P,
    path: &Path,
    base: Duration,
    state: &mut RetryState,
    shutdown: &Shutdown,
) -> PublishOutcome {
    let mut failures = 0;
    loop {
        if shutdown.is_cancelled() {
            return PublishOutcome::Cancelled { failures };
        }
        match publisher.publish(path).await {
            Ok(post) => {
                state.reset();
                return PublishOutcome::Published { post, failures };
            }
            Err(e) if !e.is_retryable() => {
                log::error!("Giving up on {}: {}", path.display(), e);
                state.reset();
                return PublishOutcome::Abandoned {
                    failures: failures + 1,
                };
            }
            Err(e) => {
                failures += 1;
                let wait = state.wait(base);
                log::warn!(
                    "Publishing {} failed: {}. Retrying in {}s",
                    path.display(),
                    e,
                    wait.as_secs()
                );
                state.record_failure();
                if !shutdown.sleep(wait).await {
                    return PublishOutcome::Cancelled { failures };
                }
            }
        }
    }
}
