use crate::prelude::{
    ProcessingStage, SignalConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;
use ndarray::Array1;

/// Sorted-mean filter: subtracts from each sample the mean of its window
/// without the window maximum, sharpening beats against the baseline.
pub struct PeakEmphasisStage {
    window: Option<usize>,
    logger: LogManager,
}

impl PeakEmphasisStage {
    pub fn new() -> Self {
        Self {
            window: None,
            logger: LogManager::new("emphasis"),
        }
    }
}

impl Default for PeakEmphasisStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for PeakEmphasisStage {
    fn initialize(&mut self, config: &SignalConfig) -> StageResult<()> {
        let window = config.emphasis_window();
        if window < 3 {
            return Err(StageError::InvalidInput(format!(
                "emphasis window of {} samples is too small",
                window
            )));
        }
        self.window = Some(window);
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let n = self
            .window
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        if input.samples.len() < n {
            return Err(StageError::InvalidInput(format!(
                "expected at least {} samples",
                n
            )));
        }

        let signal = Array1::from(input.samples);
        let mut output = signal.clone();
        let half = (n - 1) / 2;

        // Edges keep their filtered value; windows always read the unmodified signal.
        for (offset, window) in signal.windows(n).into_iter().enumerate() {
            let (sum, max) = window
                .iter()
                .fold((0.0, f64::NEG_INFINITY), |(sum, max), &v| (sum + v, max.max(v)));
            let center = offset + half;
            output[center] = signal[center] - (sum - max) / (n - 1) as f64;
        }

        self.logger
            .trace(&format!("emphasized {} samples, window {}", output.len(), n));

        Ok(StageOutput {
            samples: output.to_vec(),
            metadata: StageMetadata {
                notes: vec![format!("emphasis window {}", n)],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.window = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SignalConfig {
        // 60 * 3.0 / 60 = 3 -> window of 7 samples
        SignalConfig {
            sample_rate: 3.0,
            emphasis_max_bpm: 60.0,
            ..SignalConfig::default()
        }
    }

    #[test]
    fn isolated_peak_is_preserved_and_edges_untouched() {
        let mut stage = PeakEmphasisStage::new();
        stage.initialize(&small_config()).unwrap();
        let mut samples = vec![1.0; 11];
        samples[5] = 8.0;
        let output = stage
            .execute(StageInput { samples: samples.clone() })
            .unwrap();

        // Window around the peak excludes the peak itself: 8 - 6/6.
        assert_eq!(output.samples[5], 7.0);
        // Flat neighbours within reach of the peak drop to zero.
        assert_eq!(output.samples[4], 0.0);
        for idx in [0, 1, 2, 8, 9, 10] {
            assert_eq!(output.samples[idx], samples[idx]);
        }
        stage.cleanup();
    }

    #[test]
    fn default_window_spans_thirty_three_samples() {
        let mut stage = PeakEmphasisStage::new();
        stage.initialize(&SignalConfig::default()).unwrap();
        let output = stage
            .execute(StageInput { samples: vec![0.0; 33] })
            .unwrap();
        assert_eq!(output.metadata.notes[0], "emphasis window 33");
    }

    #[test]
    fn short_input_is_rejected() {
        let mut stage = PeakEmphasisStage::new();
        stage.initialize(&SignalConfig::default()).unwrap();
        let result = stage.execute(StageInput { samples: vec![0.0; 10] });
        assert!(matches!(result, Err(StageError::InvalidInput(_))));
    }
}
