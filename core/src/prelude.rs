use serde::{Deserialize, Serialize};

/// Shared configuration for each heart-rate processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Sampling rate of the channel in frames per second.
    pub sample_rate: f64,
    /// Number of samples in one analysis window.
    pub window_len: usize,
    /// Slowest heart rate searched for in the autocorrelation.
    pub min_bpm: f64,
    /// Fastest heart rate searched for in the autocorrelation.
    pub max_bpm: f64,
    /// Fastest physiologically plausible heart rate, sizes the peak-emphasis window.
    pub emphasis_max_bpm: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            sample_rate: 60.0,
            window_len: 600,
            min_bpm: 40.0,
            max_bpm: 200.0,
            emphasis_max_bpm: 220.0,
        }
    }
}

impl SignalConfig {
    /// Shortest lag (1-based) considered a heartbeat period.
    pub fn min_lag(&self) -> usize {
        (60.0 * self.sample_rate / self.max_bpm).round() as usize
    }

    /// Longest lag (1-based) considered a heartbeat period.
    pub fn max_lag(&self) -> usize {
        (60.0 * self.sample_rate / self.min_bpm).round() as usize
    }

    /// Width of the peak-emphasis window, always odd.
    pub fn emphasis_window(&self) -> usize {
        let nsamples = (60.0 * self.sample_rate / self.emphasis_max_bpm).round() as usize;
        2 * nsamples + 1
    }

    pub fn bpm_for_lag(&self, lag: usize) -> i32 {
        (60.0 * self.sample_rate / lag as f64).round() as i32
    }
}

/// Heart rate and confidence extracted from one analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateEstimate {
    pub bpm: i32,
    pub confidence: f64,
}

impl HeartRateEstimate {
    /// Result reported for windows without usable periodicity.
    pub const DEGENERATE: HeartRateEstimate = HeartRateEstimate {
        bpm: 0,
        confidence: 0.0,
    };

    pub fn is_degenerate(&self) -> bool {
        self.bpm <= 0
    }
}

/// Input payload for a processing stage.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub samples: Vec<f64>,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub samples: Vec<f64>,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub estimate: Option<HeartRateEstimate>,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing the signal-processing stages chained per analysis window.
pub trait ProcessingStage {
    fn initialize(&mut self, config: &SignalConfig) -> StageResult<()>;
    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput>;
    fn cleanup(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lags_cover_forty_to_two_hundred_bpm() {
        let config = SignalConfig::default();
        assert_eq!(config.min_lag(), 18);
        assert_eq!(config.max_lag(), 90);
        assert_eq!(config.emphasis_window(), 33);
    }

    #[test]
    fn degenerate_estimate_has_no_rate() {
        assert!(HeartRateEstimate::DEGENERATE.is_degenerate());
        assert_eq!(HeartRateEstimate::DEGENERATE.confidence, 0.0);
    }
}
