use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use ppgcore::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub identifier: String,
    pub pipeline: PipelineConfig,
    pub generator: GeneratorConfig,
    /// Simulated seconds a live session samples for.
    pub live_seconds: f64,
    /// Factor by which the synthetic camera outruns real time.
    pub speedup: f64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            identifier: "heartRate".into(),
            pipeline: PipelineConfig::default(),
            generator: GeneratorConfig::default(),
            live_seconds: 20.0,
            speedup: 1.0,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .pipeline
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(bpm: f64, live_seconds: f64, speedup: f64) -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            generator: GeneratorConfig {
                bpm,
                frame_rate: pipeline.frame_rate,
                settle_seconds: pipeline.settle_seconds,
                ..Default::default()
            },
            pipeline,
            live_seconds,
            speedup,
            ..Default::default()
        }
    }
}
