use crate::prelude::SignalConfig;
use crate::processing::kernel::KERNEL_TAPS;
use serde::{Deserialize, Serialize};

/// Frame rates the bandpass kernel is tuned for, preferred rate first.
pub const SUPPORTED_FRAME_RATES: [u32; 1] = [60];

/// Lowest frame rate at which a sampling-rate estimate is attempted.
pub const MIN_ESTIMATE_FRAME_RATE: f64 = 12.0;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("frame rate {0} is not supported")]
    UnsupportedFrameRate(u32),
    #[error("window of {len} samples is too short, at least {required} are needed")]
    WindowTooShort { len: usize, required: usize },
    #[error("{name} must lie in [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Immutable tuning for one recording session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub frame_rate: u32,
    pub window_seconds: f64,
    pub settle_seconds: f64,
    pub min_confidence: f64,
    pub min_red_level: f64,
    pub compute_workers: usize,
    pub ingest_capacity: usize,
    pub drain_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_rate: SUPPORTED_FRAME_RATES[0],
            window_seconds: 10.0,
            settle_seconds: 3.0,
            min_confidence: 0.5,
            min_red_level: 0.9,
            compute_workers: 2,
            ingest_capacity: 1024,
            drain_timeout_ms: 2000,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_FRAME_RATES.contains(&self.frame_rate) {
            return Err(ConfigError::UnsupportedFrameRate(self.frame_rate));
        }
        let len = self.window_len();
        let required = self.min_window_len();
        if len < required {
            return Err(ConfigError::WindowTooShort { len, required });
        }
        for (name, value) in [
            ("min_confidence", self.min_confidence),
            ("min_red_level", self.min_red_level),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if self.compute_workers == 0 {
            return Err(ConfigError::Zero("compute_workers"));
        }
        if self.ingest_capacity == 0 {
            return Err(ConfigError::Zero("ingest_capacity"));
        }
        Ok(())
    }

    /// Samples per analysis window, `round(fs * window_seconds)`.
    pub fn window_len(&self) -> usize {
        let len = (f64::from(self.frame_rate) * self.window_seconds).round();
        if len.is_finite() && len > 0.0 {
            len as usize
        } else {
            0
        }
    }

    /// Shortest window that survives the bandpass trim with every period lag left.
    pub fn min_window_len(&self) -> usize {
        KERNEL_TAPS + self.signal_config().max_lag()
    }

    pub fn sample_rate(&self) -> f64 {
        f64::from(self.frame_rate)
    }

    /// Frames needed before the sampling rate is estimated.
    pub fn min_rate_samples(&self) -> usize {
        (self.window_seconds * MIN_ESTIMATE_FRAME_RATE).round().max(2.0) as usize
    }

    pub fn signal_config(&self) -> SignalConfig {
        SignalConfig {
            sample_rate: self.sample_rate(),
            window_len: self.window_len(),
            ..SignalConfig::default()
        }
    }
}
