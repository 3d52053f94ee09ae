pub mod bpm;
pub mod color;

pub use bpm::{BpmSample, SessionSummary};
pub use color::ColorSample;
