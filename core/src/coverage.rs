//! Finger-on-lens detection from a single color sample.

use crate::records::ColorSample;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default fraction of red-dominant pixels required for coverage.
pub const DEFAULT_MIN_RED_LEVEL: f64 = 0.9;

/// Covered when the frame is overwhelmingly red, in the red hue band and
/// well saturated.
pub fn is_covered(sample: &ColorSample) -> bool {
    LensCoverageClassifier::default().classify(sample)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensCoverageClassifier {
    min_red_level: f64,
}

impl LensCoverageClassifier {
    pub fn new(min_red_level: f64) -> Self {
        Self { min_red_level }
    }

    pub fn classify(&self, sample: &ColorSample) -> bool {
        let ColorSample {
            red,
            green,
            blue,
            red_level,
            ..
        } = *sample;

        if red_level < self.min_red_level || red <= green || red <= blue {
            return false;
        }

        // Hue and saturation with red as the value maximum.
        let delta = red - green.min(blue);
        let mut hue = 60.0 * (green - blue) / delta;
        if hue < 0.0 {
            hue += 360.0;
        }
        let saturation = delta / red;

        (hue <= 30.0 || hue >= 350.0) && saturation >= 0.7
    }
}

impl Default for LensCoverageClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RED_LEVEL)
    }
}

/// Remembers the last coverage state so only transitions are reported.
#[derive(Debug, Default)]
pub struct CoverageTracker {
    covered: AtomicBool,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_covered(&self) -> bool {
        self.covered.load(Ordering::Acquire)
    }

    /// Stores `covered` and returns it when it differs from the previous state.
    pub fn update(&self, covered: bool) -> Option<bool> {
        let previous = self.covered.swap(covered, Ordering::AcqRel);
        (previous != covered).then_some(covered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(red: f64, green: f64, blue: f64, red_level: f64) -> ColorSample {
        ColorSample::new(0.0, red, green, blue, red_level)
    }

    #[test]
    fn pure_red_is_covered() {
        assert!(is_covered(&sample(1.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn green_dominant_is_not_covered() {
        assert!(!is_covered(&sample(0.0, 1.0, 0.0, 1.0)));
    }

    #[test]
    fn low_red_level_is_not_covered() {
        assert!(!is_covered(&sample(1.0, 0.0, 0.0, 0.89)));
        assert!(LensCoverageClassifier::new(0.8).classify(&sample(1.0, 0.0, 0.0, 0.89)));
    }

    #[test]
    fn orange_hue_is_not_covered() {
        // hue = 60 * 0.6 / 0.9 = 40 degrees
        assert!(!is_covered(&sample(0.9, 0.6, 0.0, 1.0)));
    }

    #[test]
    fn magenta_edge_wraps_hue() {
        // hue = 60 * (-0.05) / 0.9 + 360 ~ 356.7 degrees
        assert!(is_covered(&sample(0.9, 0.0, 0.05, 1.0)));
        // hue ~ 320 degrees
        assert!(!is_covered(&sample(0.9, 0.0, 0.6, 1.0)));
    }

    #[test]
    fn washed_out_red_is_not_covered() {
        // saturation = 0.4 / 1.0
        assert!(!is_covered(&sample(1.0, 0.6, 0.6, 1.0)));
    }

    #[test]
    fn tracker_reports_only_transitions() {
        let tracker = CoverageTracker::new();
        assert_eq!(tracker.update(false), None);
        assert_eq!(tracker.update(true), Some(true));
        assert_eq!(tracker.update(true), None);
        assert_eq!(tracker.update(false), Some(false));
        assert!(!tracker.is_covered());
    }
}
