use crate::generator::profile::{build_recording, GeneratorConfig};
use crate::generator::source::SyntheticSource;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::warn;
use ppgcore::coverage::LensCoverageClassifier;
use ppgcore::persist::{write_summary, PersistenceSinks};
use ppgcore::prelude::HeartRateEstimate;
use ppgcore::processing::find_heart_rate_values;
use ppgcore::results::{ReadingSummary, SummaryMode};
use ppgcore::window::estimated_sampling_rate;
use ppgcore::{ColorSample, PipelineCoordinator, PipelineEvent, SessionSummary};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Estimates from one offline pass over a recording.
#[derive(Debug, Clone, Serialize)]
pub struct OfflineResult {
    pub estimates: Vec<HeartRateEstimate>,
    pub covered_samples: usize,
    pub sampling_rate: Option<f64>,
}

#[derive(Debug)]
pub struct LiveOutcome {
    pub summary: SessionSummary,
    pub reading: Option<ReadingSummary>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Re-analyzes the covered samples of a recording in one batch.
    pub fn analyze(&self, samples: &[ColorSample]) -> anyhow::Result<OfflineResult> {
        let pipeline = &self.config.pipeline;
        let classifier = LensCoverageClassifier::new(pipeline.min_red_level);
        let green: Vec<f64> = samples
            .iter()
            .filter(|s| classifier.classify(s))
            .map(|s| s.green)
            .collect();

        let estimates = find_heart_rate_values(&green, &pipeline.signal_config())
            .context("analyzing covered samples")?;
        let sampling_rate = estimated_sampling_rate(
            samples,
            |s| classifier.classify(s),
            pipeline.min_rate_samples(),
        );

        Ok(OfflineResult {
            estimates,
            covered_samples: green.len(),
            sampling_rate,
        })
    }

    pub fn analyze_generated(&self, generator: &GeneratorConfig) -> anyhow::Result<OfflineResult> {
        let samples = build_recording(generator).context("building synthetic recording")?;
        self.analyze(&samples)
    }

    /// Samples the synthetic camera through a full pipeline session for
    /// `live_seconds` of simulated time, forwarding every event to `on_event`.
    pub async fn run_live<F>(
        &self,
        output_dir: Option<&Path>,
        mut on_event: F,
    ) -> anyhow::Result<LiveOutcome>
    where
        F: FnMut(&PipelineEvent),
    {
        let config = &self.config;
        let source = SyntheticSource::new(config.generator.clone(), config.speedup);
        let mut pipeline =
            PipelineCoordinator::new(config.identifier.clone(), config.pipeline.clone(), Box::new(source))
                .context("creating pipeline")?;
        if let Some(dir) = output_dir {
            let sinks = PersistenceSinks::create_in(dir, &config.identifier)
                .with_context(|| format!("creating output files in {}", dir.display()))?;
            pipeline = pipeline.with_persistence(sinks);
        }

        let mut events = pipeline.subscribe();
        pipeline.start().context("starting pipeline")?;

        let speedup = if config.speedup > 0.0 { config.speedup } else { 1.0 };
        let deadline = tokio::time::sleep(Duration::from_secs_f64(
            config.live_seconds.max(0.0) / speedup,
        ));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                event = events.recv() => match event {
                    Ok(event) => on_event(&event),
                    Err(RecvError::Lagged(skipped)) => warn!("presentation lagged, {} events skipped", skipped),
                    Err(RecvError::Closed) => break,
                },
            }
        }

        let summary = pipeline.stop().await.context("stopping pipeline")?;
        while let Ok(event) = events.try_recv() {
            on_event(&event);
        }

        if let Some(dir) = output_dir {
            let path = dir.join(format!("{}_summary.json", config.identifier));
            let file = File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_summary(file, &summary).with_context(|| format!("writing {}", path.display()))?;
        }

        Ok(LiveOutcome {
            reading: pipeline.summarize(SummaryMode::Resting),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppgcore::pipeline::PipelineError;

    #[test]
    fn offline_analysis_recovers_generated_rate() {
        let cfg = WorkflowConfig::from_args(72.0, 20.0, 1.0);
        let runner = Runner::new(cfg.clone());
        let generator = GeneratorConfig {
            bpm: 72.0,
            duration_seconds: 20.0,
            seed: 5,
            ..cfg.generator.clone()
        };
        let result = runner.analyze_generated(&generator).unwrap();
        assert_eq!(result.covered_samples, 1200);
        // floor(1200 / 300) - 1
        assert_eq!(result.estimates.len(), 3);
        for estimate in &result.estimates {
            assert!((estimate.bpm - 72).abs() <= 3, "bpm {}", estimate.bpm);
        }
        let rate = result.sampling_rate.unwrap();
        assert!((rate - 60.0).abs() < 1.0, "rate {}", rate);
    }

    #[test]
    fn uncovered_recording_yields_no_estimates() {
        let runner = Runner::new(WorkflowConfig::default());
        let generator = GeneratorConfig {
            duration_seconds: 0.0,
            settle_seconds: 20.0,
            ..Default::default()
        };
        let result = runner.analyze_generated(&generator).unwrap();
        assert_eq!(result.covered_samples, 0);
        assert!(result.estimates.is_empty());
        assert!(result.sampling_rate.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn live_session_publishes_and_persists() {
        let mut cfg = WorkflowConfig::from_args(65.0, 20.0, 20.0);
        cfg.generator.settle_seconds = 1.0;
        cfg.generator.seed = 9;
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(cfg);

        let mut events = Vec::new();
        let outcome = runner
            .run_live(Some(dir.path()), |event| events.push(event.clone()))
            .await
            .unwrap();

        assert!(!outcome.summary.samples.is_empty());
        for sample in &outcome.summary.samples {
            if sample.confidence.unwrap_or(0.0) > 0.5 {
                assert!((sample.bpm.unwrap() - 65).abs() <= 3);
            }
        }
        assert!(events.contains(&PipelineEvent::LensCovered { covered: true }));
        assert!(outcome.reading.is_some());
        assert!(dir.path().join("heartRate_summary.json").exists());
        assert!(dir.path().join("heartRate_bpm.csv").exists());
    }

    #[tokio::test]
    async fn live_session_without_camera_fails() {
        let mut cfg = WorkflowConfig::default();
        cfg.generator.device_present = false;
        let err = Runner::new(cfg).run_live(None, |_| {}).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoCamera)
        ));
    }
}
