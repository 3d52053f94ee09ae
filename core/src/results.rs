//! Append-only log of rolling heart-rate results and the readings derived from it.

use crate::records::BpmSample;
use serde::{Deserialize, Serialize};

/// How a session's single summary value is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMode {
    /// Mean BPM over every confident sample.
    Resting,
    /// BPM of the first confident sample.
    SingleReading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Confident,
    Fallback,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingSummary {
    pub bpm: Option<f64>,
    pub source: SummarySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
    Other,
}

#[derive(Debug, Clone)]
pub struct ResultLog {
    samples: Vec<BpmSample>,
    current: Option<usize>,
    min_confidence: f64,
}

impl ResultLog {
    pub fn new(min_confidence: f64) -> Self {
        Self {
            samples: Vec::new(),
            current: None,
            min_confidence,
        }
    }

    /// Appends `sample`; returns `true` when it became the current reading.
    pub fn append(&mut self, sample: BpmSample) -> bool {
        let advances = sample.exceeds(self.min_confidence);
        self.samples.push(sample);
        if advances {
            self.current = Some(self.samples.len() - 1);
        }
        advances
    }

    /// Most recent sample whose confidence exceeded the threshold.
    pub fn current(&self) -> Option<&BpmSample> {
        self.current.and_then(|idx| self.samples.get(idx))
    }

    pub fn samples(&self) -> &[BpmSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn confident(&self) -> impl Iterator<Item = &BpmSample> + '_ {
        let threshold = self.min_confidence;
        self.samples
            .iter()
            .filter(move |s| s.meets(threshold) && s.bpm.is_some())
    }

    pub fn summarize(&self, mode: SummaryMode) -> ReadingSummary {
        let confident = match mode {
            SummaryMode::Resting => {
                let values: Vec<f64> = self
                    .confident()
                    .filter_map(|s| s.bpm)
                    .map(f64::from)
                    .collect();
                (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
            }
            SummaryMode::SingleReading => self.peak().and_then(|s| s.bpm).map(f64::from),
        };

        if let Some(bpm) = confident {
            return ReadingSummary {
                bpm: Some(bpm),
                source: SummarySource::Confident,
            };
        }

        // The first window is often unsettled, prefer the second sample.
        let fallback = self
            .samples
            .get(1)
            .and_then(|s| s.bpm)
            .or_else(|| self.samples.first().and_then(|s| s.bpm));
        match fallback {
            Some(bpm) => ReadingSummary {
                bpm: Some(f64::from(bpm)),
                source: SummarySource::Fallback,
            },
            None => ReadingSummary {
                bpm: None,
                source: SummarySource::Empty,
            },
        }
    }

    /// First confident sample.
    pub fn peak(&self) -> Option<&BpmSample> {
        self.confident().next()
    }

    /// Last confident sample.
    pub fn end(&self) -> Option<&BpmSample> {
        self.confident().last()
    }

    /// VO2max estimate from confident samples at or after `start_uptime`.
    /// Needs at least two qualifying samples.
    pub fn vo2_max(&self, sex: Sex, age: f64, start_uptime: f64) -> Option<f64> {
        let values: Vec<f64> = self
            .confident()
            .filter(|s| s.uptime >= start_uptime)
            .filter_map(|s| s.bpm)
            .map(f64::from)
            .collect();
        if values.len() < 2 {
            return None;
        }

        let mean_hr = values.iter().sum::<f64>() / values.len() as f64;
        let beats_30_to_60 = mean_hr / 2.0;
        let estimate = match sex {
            Sex::Female => 83.477 - 0.586 * beats_30_to_60 - 0.404 * age - 7.030,
            Sex::Male => 83.477 - 0.586 * beats_30_to_60 - 0.404 * age,
            Sex::Other => 84.687 - 0.722 * beats_30_to_60 - 0.383 * age,
        };
        Some(estimate)
    }
}

impl Default for ResultLog {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bpm(uptime: f64, bpm: i32, confidence: f64) -> BpmSample {
        BpmSample::new(uptime, Some(bpm), Some(confidence))
    }

    #[test]
    fn current_only_advances_on_confident_samples() {
        let mut log = ResultLog::new(0.5);
        assert!(!log.append(bpm(5.0, 60, 0.3)));
        assert!(log.current().is_none());
        assert!(log.append(bpm(10.0, 70, 0.9)));
        assert!(!log.append(bpm(15.0, 80, 0.4)));
        assert_eq!(log.current(), Some(&bpm(10.0, 70, 0.9)));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn threshold_confidence_does_not_advance_current() {
        let mut log = ResultLog::new(0.5);
        assert!(!log.append(bpm(5.0, 60, 0.5)));
        assert!(log.current().is_none());
    }

    #[test]
    fn resting_summary_averages_confident_samples() {
        let mut log = ResultLog::new(0.5);
        log.append(bpm(5.0, 60, 0.6));
        log.append(bpm(10.0, 200, 0.1));
        log.append(bpm(15.0, 70, 0.5));
        let summary = log.summarize(SummaryMode::Resting);
        assert_eq!(summary.bpm, Some(65.0));
        assert_eq!(summary.source, SummarySource::Confident);
    }

    #[test]
    fn single_reading_uses_first_confident_sample() {
        let mut log = ResultLog::new(0.5);
        log.append(bpm(5.0, 90, 0.2));
        log.append(bpm(10.0, 120, 0.8));
        log.append(bpm(15.0, 110, 0.9));
        let summary = log.summarize(SummaryMode::SingleReading);
        assert_eq!(summary.bpm, Some(120.0));
        assert_eq!(log.end().and_then(|s| s.bpm), Some(110));
    }

    #[test]
    fn fallback_prefers_second_sample_and_is_bounds_checked() {
        let mut log = ResultLog::new(0.5);
        assert_eq!(log.summarize(SummaryMode::Resting).source, SummarySource::Empty);

        log.append(bpm(5.0, 58, 0.1));
        let summary = log.summarize(SummaryMode::Resting);
        assert_eq!(summary.bpm, Some(58.0));
        assert_eq!(summary.source, SummarySource::Fallback);

        log.append(bpm(10.0, 61, 0.2));
        assert_eq!(log.summarize(SummaryMode::SingleReading).bpm, Some(61.0));
    }

    #[test]
    fn fallback_without_any_bpm_is_empty() {
        let mut log = ResultLog::new(0.5);
        log.append(BpmSample::new(5.0, None, Some(0.0)));
        let summary = log.summarize(SummaryMode::Resting);
        assert_eq!(summary.bpm, None);
        assert_eq!(summary.source, SummarySource::Empty);
    }

    #[test]
    fn vo2_max_requires_two_samples_after_start() {
        let mut log = ResultLog::new(0.5);
        log.append(bpm(5.0, 100, 0.9));
        log.append(bpm(10.0, 120, 0.9));
        log.append(bpm(15.0, 140, 0.9));
        assert!(log.vo2_max(Sex::Male, 30.0, 12.0).is_none());

        // mean 130 -> 65 beats per 30 s
        let male = log.vo2_max(Sex::Male, 30.0, 8.0).unwrap();
        assert!((male - (83.477 - 0.586 * 65.0 - 0.404 * 30.0)).abs() < 1e-9);
        let female = log.vo2_max(Sex::Female, 30.0, 8.0).unwrap();
        assert!((male - female - 7.030).abs() < 1e-9);
    }
}
