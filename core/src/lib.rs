//! Sampling and signal-processing core for camera-based heart-rate measurement.
//!
//! Color samples from a fingertip-covered camera are classified, folded into
//! half-overlapping windows and turned into BPM estimates by a chain of
//! processing stages running off the capture path.

pub mod config;
pub mod coverage;
pub mod math;
pub mod persist;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod records;
pub mod results;
pub mod telemetry;
pub mod window;

pub use config::PipelineConfig;
pub use pipeline::{CaptureSource, PipelineCoordinator, PipelineEvent, PipelineState, SampleSink};
pub use prelude::{HeartRateEstimate, ProcessingStage, StageInput, StageOutput};
pub use records::{BpmSample, ColorSample, SessionSummary};
