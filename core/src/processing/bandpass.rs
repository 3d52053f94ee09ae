use crate::math::convolution::{convolve, ConvolutionMode};
use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingStage, SignalConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::processing::kernel::{BANDPASS_KERNEL, KERNEL_TAPS, KERNEL_TRIM_BACK, KERNEL_TRIM_FRONT};
use crate::telemetry::log::LogManager;

/// Mean-centers a window and passes it through the fixed FIR bandpass,
/// dropping the convolution edges.
pub struct BandpassStage {
    config: Option<SignalConfig>,
    logger: LogManager,
}

impl BandpassStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("bandpass"),
        }
    }
}

impl Default for BandpassStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for BandpassStage {
    fn initialize(&mut self, config: &SignalConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        if self.config.is_none() {
            return Err(StageError::Internal("stage not initialized".into()));
        }

        if input.samples.len() <= KERNEL_TAPS {
            return Err(StageError::InvalidInput(format!(
                "expected more than {} samples, got {}",
                KERNEL_TAPS,
                input.samples.len()
            )));
        }

        let sanitized: Vec<f64> = input
            .samples
            .iter()
            .map(|&v| if v.is_finite() { v } else { 0.0 })
            .collect();
        let mean = StatsHelper::mean(&sanitized);
        let centered: Vec<f64> = sanitized.iter().map(|v| v - mean).collect();

        let filtered = convolve(&centered, &BANDPASS_KERNEL, ConvolutionMode::Same);
        let trimmed = filtered[KERNEL_TRIM_FRONT..filtered.len() - KERNEL_TRIM_BACK].to_vec();

        let rms = StatsHelper::rms(&trimmed);
        self.logger.trace(&format!("bandpass RMS {:.6}", rms));

        Ok(StageOutput {
            samples: trimmed,
            metadata: StageMetadata {
                notes: vec![format!("bandpass RMS {:.6}", rms)],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(samples: Vec<f64>) -> StageResult<StageOutput> {
        let mut stage = BandpassStage::new();
        stage.initialize(&SignalConfig::default())?;
        let output = stage.execute(StageInput { samples });
        stage.cleanup();
        output
    }

    #[test]
    fn bandpass_trims_convolution_edges() {
        let output = run(vec![0.5; 600]).unwrap();
        assert_eq!(output.samples.len(), 471);
    }

    #[test]
    fn constant_offset_is_removed() {
        let output = run(vec![0.7; 600]).unwrap();
        assert!(output.samples.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn non_finite_samples_are_zeroed() {
        let mut samples = vec![0.0; 300];
        samples[150] = f64::NAN;
        samples[151] = f64::INFINITY;
        let output = run(samples).unwrap();
        assert!(output.samples.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn short_input_is_rejected() {
        assert!(matches!(run(vec![1.0; 64]), Err(StageError::InvalidInput(_))));
    }

    #[test]
    fn uninitialized_stage_fails() {
        let mut stage = BandpassStage::new();
        let result = stage.execute(StageInput { samples: vec![0.0; 600] });
        assert!(matches!(result, Err(StageError::Internal(_))));
    }
}
