use crate::prelude::HeartRateEstimate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One rolling heart-rate result, persisted as `uptime, bpm, confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpmSample {
    /// Uptime of the midpoint sample of the source window.
    pub uptime: f64,
    pub bpm: Option<i32>,
    pub confidence: Option<f64>,
}

impl BpmSample {
    pub fn new(uptime: f64, bpm: Option<i32>, confidence: Option<f64>) -> Self {
        Self {
            uptime,
            bpm,
            confidence,
        }
    }

    pub fn from_estimate(uptime: f64, estimate: HeartRateEstimate) -> Self {
        let bpm = (!estimate.is_degenerate()).then_some(estimate.bpm);
        Self::new(uptime, bpm, Some(estimate.confidence))
    }

    /// True when the confidence reaches `threshold` (inclusive).
    pub fn meets(&self, threshold: f64) -> bool {
        self.confidence.map_or(false, |c| c >= threshold)
    }

    /// True when the confidence is strictly above `threshold`.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.confidence.map_or(false, |c| c > threshold)
    }
}

/// JSON document describing a finished recording session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub samples: Vec<BpmSample>,
}

impl SessionSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_estimate_has_no_bpm() {
        let sample = BpmSample::from_estimate(4.0, HeartRateEstimate::DEGENERATE);
        assert_eq!(sample.bpm, None);
        assert_eq!(sample.confidence, Some(0.0));
    }

    #[test]
    fn threshold_checks_distinguish_inclusive_and_strict() {
        let sample = BpmSample::new(1.0, Some(70), Some(0.5));
        assert!(sample.meets(0.5));
        assert!(!sample.exceeds(0.5));
        assert!(!BpmSample::new(1.0, Some(70), None).meets(0.0));
    }

    #[test]
    fn summary_serializes_expected_keys() {
        let summary = SessionSummary {
            identifier: "heartRate_before".into(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            samples: vec![BpmSample::new(5.0, Some(72), Some(0.8))],
        };
        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(value["identifier"], "heartRate_before");
        assert!(value.get("start_date").is_some());
        assert!(value.get("end_date").is_some());
        assert_eq!(value["samples"][0]["bpm"], 72);
        assert_eq!(value["samples"][0]["uptime"], 5.0);
    }
}
