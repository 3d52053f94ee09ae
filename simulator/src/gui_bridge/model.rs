use ppgcore::{PipelineEvent, PipelineState, SessionSummary};
use serde::{Deserialize, Serialize};

/// Latest reading as shown to a presentation client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReadingModel {
    pub covered: bool,
    pub bpm: Option<i32>,
    pub confidence: Option<f64>,
    pub uptime: Option<f64>,
    pub state: Option<String>,
}

impl ReadingModel {
    pub fn apply(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::LensCovered { covered } => self.covered = *covered,
            PipelineEvent::CurrentBpm {
                uptime,
                bpm,
                confidence,
            } => {
                self.bpm = Some(*bpm);
                self.confidence = Some(*confidence);
                self.uptime = Some(*uptime);
            }
            PipelineEvent::StateChanged { state } => {
                if *state == PipelineState::Sampling {
                    *self = ReadingModel::default();
                }
                self.state = Some(state.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BridgeState {
    pub reading: ReadingModel,
    pub summary: Option<SessionSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_update_the_reading() {
        let mut model = ReadingModel::default();
        model.apply(&PipelineEvent::StateChanged {
            state: PipelineState::Sampling,
        });
        model.apply(&PipelineEvent::LensCovered { covered: true });
        model.apply(&PipelineEvent::CurrentBpm {
            uptime: 5.0,
            bpm: 66,
            confidence: 0.7,
        });
        assert!(model.covered);
        assert_eq!(model.bpm, Some(66));
        assert_eq!(model.state.as_deref(), Some("sampling"));
    }
}
