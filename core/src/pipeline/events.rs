use serde::Serialize;
use std::fmt;

/// Capacity of the presentation broadcast channel.
pub const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Sampling,
    Stopping,
    Finished,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Idle => "idle",
            PipelineState::Sampling => "sampling",
            PipelineState::Stopping => "stopping",
            PipelineState::Finished => "finished",
        };
        f.write_str(label)
    }
}

/// Notifications pushed to presentation subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// The lens coverage state flipped.
    LensCovered { covered: bool },
    /// A result above the confidence threshold became the current reading.
    CurrentBpm {
        uptime: f64,
        bpm: i32,
        confidence: f64,
    },
    StateChanged { state: PipelineState },
}
