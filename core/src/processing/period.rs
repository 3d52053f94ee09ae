use crate::math::fft::FftHelper;
use crate::math::stats::StatsHelper;
use crate::prelude::{
    HeartRateEstimate, ProcessingStage, SignalConfig, StageError, StageInput, StageMetadata,
    StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Zero-lag energy below which a window is treated as flat.
pub const MIN_AUTOCORRELATION_ENERGY: f64 = 1e-12;

/// Autocorrelation-based period detection. Emits the lag-domain
/// autocorrelation restricted to plausible heart-rate lags and the
/// resulting estimate in the stage metadata.
pub struct PeriodStage {
    config: Option<SignalConfig>,
    logger: LogManager,
}

impl PeriodStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("period"),
        }
    }
}

impl Default for PeriodStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for PeriodStage {
    fn initialize(&mut self, config: &SignalConfig) -> StageResult<()> {
        if config.min_lag() == 0 || config.min_lag() > config.max_lag() {
            return Err(StageError::InvalidInput(format!(
                "lag range {}..={} is empty",
                config.min_lag(),
                config.max_lag()
            )));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        if input.samples.is_empty() {
            return Err(StageError::InvalidInput("no samples to correlate".into()));
        }

        let acf = FftHelper::autocorrelate(&input.samples);
        let (zero_lag, max_val) = StatsHelper::argmax(&acf)
            .ok_or_else(|| StageError::InvalidInput("autocorrelation is undefined".into()))?;

        // Autocorrelation is even, keep the half starting at the global maximum.
        let lags = &acf[zero_lag..];
        let lower = config.min_lag();
        let upper = config.max_lag();
        if lags.len() < upper {
            return Err(StageError::InvalidInput(format!(
                "{} lags available, {} required",
                lags.len(),
                upper
            )));
        }

        let mut restricted = vec![0.0; upper];
        restricted[lower - 1..].copy_from_slice(&lags[lower - 1..upper]);

        let estimate = if !max_val.is_finite() || max_val <= MIN_AUTOCORRELATION_ENERGY {
            HeartRateEstimate::DEGENERATE
        } else {
            match StatsHelper::argmax(&restricted) {
                Some((pos, val)) if val > 0.0 => HeartRateEstimate {
                    bpm: config.bpm_for_lag(pos + 1),
                    confidence: val / max_val,
                },
                _ => HeartRateEstimate::DEGENERATE,
            }
        };

        let note = format!("bpm {} confidence {:.3}", estimate.bpm, estimate.confidence);
        self.logger.trace(&note);

        Ok(StageOutput {
            samples: restricted,
            metadata: StageMetadata {
                estimate: Some(estimate),
                notes: vec![note],
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
