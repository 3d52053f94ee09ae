//! Seam between a frame producer and the ingest stage.

use crate::coverage::{CoverageTracker, LensCoverageClassifier};
use crate::pipeline::events::PipelineEvent;
use crate::pipeline::stages::Ingested;
use crate::records::ColorSample;
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("no capture device available")]
    NoDevice,
    #[error("capture device failure: {0}")]
    Device(String),
}

/// A producer of color samples, typically a camera with a torch.
///
/// `open` hands the source a [`SampleSink`]; the source calls
/// [`SampleSink::deliver`] once per frame from whatever thread it owns until
/// `close` is called.
pub trait CaptureSource: Send {
    fn open(&mut self, sink: SampleSink) -> Result<(), CaptureError>;
    fn set_illumination(&mut self, enabled: bool);
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Queued,
    /// The ingest queue was full.
    Dropped,
    /// The session is shutting down or finished.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub covered: bool,
    pub status: DeliveryStatus,
    /// Set when the lens just became uncovered; the source should make sure
    /// its torch is still on.
    pub illumination_required: bool,
}

/// Frame-delivery callback handed to a [`CaptureSource`]. Never blocks.
#[derive(Clone)]
pub struct SampleSink {
    tx: mpsc::Sender<Ingested>,
    classifier: LensCoverageClassifier,
    coverage: Arc<CoverageTracker>,
    events: broadcast::Sender<PipelineEvent>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl SampleSink {
    pub(crate) fn new(
        tx: mpsc::Sender<Ingested>,
        classifier: LensCoverageClassifier,
        coverage: Arc<CoverageTracker>,
        events: broadcast::Sender<PipelineEvent>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            tx,
            classifier,
            coverage,
            events,
            metrics,
            logger: LogManager::new("capture"),
        }
    }

    pub fn deliver(&self, sample: ColorSample) -> Delivery {
        let covered = self.classifier.classify(&sample);
        if self.tx.is_closed() {
            return self.late(covered);
        }

        self.metrics.record_received();
        let transition = self.coverage.update(covered);
        if let Some(covered) = transition {
            let _ = self.events.send(PipelineEvent::LensCovered { covered });
        }

        let status = match self.tx.try_send(Ingested { sample, covered }) {
            Ok(()) => DeliveryStatus::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_dropped();
                self.logger
                    .warn(&format!("ingest queue full, dropping sample at {:.3}", sample.uptime));
                DeliveryStatus::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return self.late(covered),
        };
        Delivery {
            covered,
            status,
            illumination_required: transition == Some(false),
        }
    }

    fn late(&self, covered: bool) -> Delivery {
        self.metrics.record_late();
        self.logger.trace("sample arrived after teardown, ignoring");
        Delivery {
            covered,
            status: DeliveryStatus::Closed,
            illumination_required: false,
        }
    }
}
