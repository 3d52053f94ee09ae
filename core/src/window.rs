//! Accumulation of covered samples into half-overlapping analysis windows.

use crate::records::ColorSample;

/// Green-channel values of one full window, consumed once by the estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisWindow {
    /// Zero-based index of the window within the session.
    pub sequence: u64,
    /// Uptime of the sample at index `window_len / 2`.
    pub uptime: f64,
    pub channel: Vec<f64>,
}

/// Buffers covered samples and emits a window every `window_len / 2` samples
/// once the first `window_len` have arrived.
#[derive(Debug)]
pub struct WindowAccumulator {
    window_len: usize,
    buffer: Vec<ColorSample>,
    emitted: u64,
}

impl WindowAccumulator {
    pub fn new(window_len: usize) -> Self {
        Self {
            window_len,
            buffer: Vec::with_capacity(window_len),
            emitted: 0,
        }
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Appends a covered sample, returning a window when one is complete.
    pub fn push(&mut self, sample: ColorSample) -> Option<AnalysisWindow> {
        self.buffer.push(sample);
        if self.window_len < 2 || self.buffer.len() < self.window_len {
            return None;
        }

        let half = self.window_len / 2;
        let uptime = self.buffer[half].uptime;
        let channel = self.buffer[..self.window_len]
            .iter()
            .map(|s| s.green)
            .collect();
        self.buffer.drain(..half);

        let window = AnalysisWindow {
            sequence: self.emitted,
            uptime,
            channel,
        };
        self.emitted += 1;
        Some(window)
    }
}

/// Incremental frame-rate estimate measured from the first covered sample.
#[derive(Debug, Default, Clone)]
pub struct SamplingRateTracker {
    first_covered: Option<f64>,
    last_uptime: Option<f64>,
    count: usize,
}

impl SamplingRateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, sample: &ColorSample, covered: bool) {
        if self.first_covered.is_none() {
            if !covered {
                return;
            }
            self.first_covered = Some(sample.uptime);
        }
        self.count += 1;
        self.last_uptime = Some(sample.uptime);
    }

    /// Frames per second, or `None` with fewer than `min_samples` frames or
    /// a non-positive time span.
    pub fn rate(&self, min_samples: usize) -> Option<f64> {
        if self.count < min_samples {
            return None;
        }
        let span = self.last_uptime? - self.first_covered?;
        (span > 0.0).then(|| self.count as f64 / span)
    }
}

/// Sampling rate of a recording measured from its first covered sample.
pub fn estimated_sampling_rate(
    samples: &[ColorSample],
    covered: impl Fn(&ColorSample) -> bool,
    min_samples: usize,
) -> Option<f64> {
    let mut tracker = SamplingRateTracker::new();
    for sample in samples {
        tracker.observe(sample, covered(sample));
    }
    tracker.rate(min_samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(index: usize) -> ColorSample {
        ColorSample::new(index as f64 / 60.0, 0.9, index as f64, 0.05, 1.0)
    }

    #[test]
    fn first_window_is_emitted_after_window_len_samples() {
        let mut accumulator = WindowAccumulator::new(600);
        for i in 0..599 {
            assert!(accumulator.push(sample(i)).is_none());
        }
        let window = accumulator.push(sample(599)).unwrap();
        assert_eq!(window.sequence, 0);
        assert_eq!(window.channel.len(), 600);
        assert_eq!(window.channel[0], 0.0);
        assert_eq!(window.channel[599], 599.0);
        assert_eq!(window.uptime, 300.0 / 60.0);
        assert_eq!(accumulator.len(), 300);
    }

    #[test]
    fn each_half_window_emits_another_window() {
        let mut accumulator = WindowAccumulator::new(600);
        let mut windows = Vec::new();
        for i in 0..1500 {
            if let Some(window) = accumulator.push(sample(i)) {
                windows.push((i, window));
            }
        }
        let emitted_at: Vec<usize> = windows.iter().map(|(i, _)| *i).collect();
        assert_eq!(emitted_at, vec![599, 899, 1199, 1499]);
        assert_eq!(windows[1].1.channel[0], 300.0);
        assert_eq!(windows[1].1.uptime, 600.0 / 60.0);
        assert_eq!(accumulator.emitted(), 4);
        assert_eq!(accumulator.len(), 300);
    }

    #[test]
    fn short_stream_never_emits() {
        let mut accumulator = WindowAccumulator::new(10);
        assert!((0..9).all(|i| accumulator.push(sample(i)).is_none()));
        accumulator.clear();
        assert!(accumulator.is_empty());
    }

    #[test]
    fn sampling_rate_starts_at_first_covered_sample() {
        let samples: Vec<ColorSample> = (0..=240).map(sample).collect();
        let rate = estimated_sampling_rate(&samples, |s| s.uptime >= 1.0, 120).unwrap();
        // 181 frames over 3 seconds
        assert!((rate - 181.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn sampling_rate_needs_enough_samples() {
        let samples: Vec<ColorSample> = (0..50).map(sample).collect();
        assert!(estimated_sampling_rate(&samples, |_| true, 120).is_none());
        assert!(estimated_sampling_rate(&samples[..1], |_| true, 1).is_none());
    }
}
