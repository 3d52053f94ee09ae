use serde::Serialize;
use std::sync::Mutex;

/// Counters collected while a session is sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetrics {
    pub samples_received: usize,
    pub samples_dropped: usize,
    pub late_samples: usize,
    pub windows_emitted: usize,
    pub estimates_published: usize,
    pub persistence_errors: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<PipelineMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PipelineMetrics::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut PipelineMetrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_received(&self) {
        self.update(|m| m.samples_received += 1);
    }

    pub fn record_dropped(&self) {
        self.update(|m| m.samples_dropped += 1);
    }

    pub fn record_late(&self) {
        self.update(|m| m.late_samples += 1);
    }

    pub fn record_window(&self) {
        self.update(|m| m.windows_emitted += 1);
    }

    pub fn record_published(&self) {
        self.update(|m| m.estimates_published += 1);
    }

    pub fn record_persistence_error(&self) {
        self.update(|m| m.persistence_errors += 1);
    }

    pub fn snapshot(&self) -> PipelineMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            PipelineMetrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
