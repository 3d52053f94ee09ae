use crate::prelude::{
    HeartRateEstimate, ProcessingStage, SignalConfig, StageError, StageInput, StageOutput,
    StageResult,
};
use crate::processing::bandpass::BandpassStage;
use crate::processing::emphasis::PeakEmphasisStage;
use crate::processing::period::PeriodStage;

/// Chains the bandpass, peak-emphasis and period stages over one window.
#[derive(Debug, Clone)]
pub struct HeartRateEstimator {
    config: SignalConfig,
}

impl HeartRateEstimator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Estimates the heart rate of the first `window_len` samples of `channel`.
    /// Returns `Ok(None)` when the channel does not fill a window.
    pub fn estimate(&self, channel: &[f64]) -> StageResult<Option<HeartRateEstimate>> {
        let window_len = self.config.window_len;
        if window_len == 0 || channel.len() < window_len {
            return Ok(None);
        }

        let filtered = run_stage(
            &mut BandpassStage::new(),
            &self.config,
            channel[..window_len].to_vec(),
        )
        .map_err(|err| with_stage("bandpass", err))?;
        let emphasized = run_stage(&mut PeakEmphasisStage::new(), &self.config, filtered.samples)
            .map_err(|err| with_stage("emphasis", err))?;
        let period = run_stage(&mut PeriodStage::new(), &self.config, emphasized.samples)
            .map_err(|err| with_stage("period", err))?;

        period
            .metadata
            .estimate
            .map(Some)
            .ok_or_else(|| StageError::Internal("period stage produced no estimate".into()))
    }

    /// Offline re-analysis: slides a window over `channel` in half-window steps,
    /// producing `floor(len / (window_len / 2)) - 1` estimates.
    pub fn find_heart_rate_values(&self, channel: &[f64]) -> StageResult<Vec<HeartRateEstimate>> {
        let window_len = self.config.window_len;
        let half = window_len / 2;
        if half == 0 {
            return Ok(Vec::new());
        }

        let frames = (channel.len() / half).saturating_sub(1);
        let mut estimates = Vec::with_capacity(frames);
        for frame in 0..frames {
            let start = frame * half;
            if start + window_len > channel.len() {
                break;
            }
            if let Some(estimate) = self.estimate(&channel[start..start + window_len])? {
                estimates.push(estimate);
            }
        }
        Ok(estimates)
    }
}

fn run_stage<S: ProcessingStage>(
    stage: &mut S,
    config: &SignalConfig,
    samples: Vec<f64>,
) -> StageResult<StageOutput> {
    stage.initialize(config)?;
    let output = stage.execute(StageInput { samples });
    stage.cleanup();
    output
}

fn with_stage(stage: &str, err: StageError) -> StageError {
    match err {
        StageError::InvalidInput(msg) => StageError::InvalidInput(format!("{}: {}", stage, msg)),
        StageError::Internal(msg) => StageError::Internal(format!("{}: {}", stage, msg)),
    }
}

/// Heart rate and confidence of one analysis window.
pub fn calculate_heart_rate(
    channel: &[f64],
    config: &SignalConfig,
) -> StageResult<Option<HeartRateEstimate>> {
    HeartRateEstimator::new(config.clone()).estimate(channel)
}

/// Batch variant of [`calculate_heart_rate`] over a pre-recorded channel.
pub fn find_heart_rate_values(
    channel: &[f64],
    config: &SignalConfig,
) -> StageResult<Vec<HeartRateEstimate>> {
    HeartRateEstimator::new(config.clone()).find_heart_rate_values(channel)
}
