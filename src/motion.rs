//! Frame differencing on the green channel.

use crate::camera::RasterFrame;
use crate::config::MotionConfig;

/// Counts changed pixels between two test frames and decides whether the
/// change is large enough to act on.
///
/// Only the green channel is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionDetector {
    threshold: u8,
    sensitivity: u32,
}

impl MotionDetector {
    /// # Arguments
    /// * `threshold` - A pixel counts as changed if its green delta is strictly greater
    /// * `sensitivity` - A comparison triggers if the changed count is strictly greater
    pub fn new(threshold: u8, sensitivity: u32) -> Self {
        Self {
            threshold,
            sensitivity,
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn sensitivity(&self) -> u32 {
        self.sensitivity
    }

    /// Number of pixels whose green value moved by more than the threshold.
    ///
    /// Both frames must come from the same test resolution.
    pub fn compare(&self, previous: &RasterFrame, current: &RasterFrame) -> u32 {
        debug_assert_eq!(
            previous.resolution(),
            current.resolution(),
            "compared frames must share a resolution"
        );

        previous
            .greens()
            .zip(current.greens())
            .filter(|(a, b)| a.abs_diff(*b) > self.threshold)
            .count() as u32
    }

    /// Whether a changed-pixel count warrants a capture.
    pub fn is_triggered(&self, changed_pixels: u32) -> bool {
        changed_pixels > self.sensitivity
    }
}

impl From<&MotionConfig> for MotionDetector {
    fn from(config: &MotionConfig) -> Self {
        Self::new(config.threshold, config.sensitivity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, level: u8) -> RasterFrame {
        RasterFrame::filled(width, height, [level, level, level])
    }

    #[test]
    fn test_identical_frames_score_zero() {
        let detector = MotionDetector::new(10, 20);
        let frame = gray(100, 75, 128);
        assert_eq!(detector.compare(&frame, &frame.clone()), 0);
    }

    #[test]
    fn test_counts_exactly_the_changed_pixels() {
        let detector = MotionDetector::new(10, 20);
        let previous = gray(10, 10, 100);
        let mut current = previous.clone();
        for i in 0..7 {
            current.set_pixel(i, i, [100, 111, 100]);
        }
        assert_eq!(detector.compare(&previous, &current), 7);
    }

    #[test]
    fn test_delta_equal_to_threshold_is_unchanged() {
        let detector = MotionDetector::new(10, 0);
        let previous = gray(4, 4, 100);
        let mut current = previous.clone();
        current.set_pixel(0, 0, [100, 110, 100]);
        current.set_pixel(1, 0, [100, 89, 100]);
        assert_eq!(detector.compare(&previous, &current), 1);
    }

    #[test]
    fn test_only_green_channel_counts() {
        let detector = MotionDetector::new(10, 0);
        let previous = gray(4, 4, 100);
        let mut current = previous.clone();
        current.set_pixel(2, 2, [255, 100, 0]);
        assert_eq!(detector.compare(&previous, &current), 0);
    }

    #[test]
    fn test_compare_is_symmetric() {
        let detector = MotionDetector::new(10, 20);
        let mut a = gray(20, 15, 0);
        let mut b = gray(20, 15, 0);
        for x in 0..20 {
            a.set_pixel(x, 3, [0, (x * 12) as u8, 0]);
            b.set_pixel(x, 3, [0, 255 - (x * 7) as u8, 0]);
        }
        assert_eq!(detector.compare(&a, &b), detector.compare(&b, &a));
    }

    #[test]
    fn test_trigger_requires_strictly_more_than_sensitivity() {
        let detector = MotionDetector::new(10, 800);
        assert!(!detector.is_triggered(0));
        assert!(!detector.is_triggered(800));
        assert!(detector.is_triggered(801));
    }

    #[test]
    fn test_from_config() {
        let detector = MotionDetector::from(&MotionConfig::default());
        assert_eq!(detector.threshold(), 10);
        assert_eq!(detector.sensitivity(), 20);
    }
}
