use crate::config::{ConfigError, PipelineConfig};
use crate::coverage::{CoverageTracker, LensCoverageClassifier};
use crate::persist::{spawn_persistence, PersistenceSinks};
use crate::pipeline::capture::{CaptureError, CaptureSource, SampleSink};
use crate::pipeline::events::{PipelineEvent, PipelineState, EVENT_CAPACITY};
use crate::pipeline::stages::{IngestStage, PublishStage};
use crate::processing::HeartRateEstimator;
use crate::records::{BpmSample, SessionSummary};
use crate::results::{ReadingSummary, ResultLog, SummaryMode};
use crate::telemetry::{LogManager, MetricsRecorder, PipelineMetrics};
use crate::window::{SamplingRateTracker, WindowAccumulator};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Measured rates further than this fraction from the configured one are reported.
const RATE_TOLERANCE: f64 = 0.1;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("no camera available")]
    NoCamera,
    #[error("cannot {action} a pipeline that is {from}")]
    InvalidTransition {
        from: PipelineState,
        action: &'static str,
    },
    #[error("pipeline must be started from within a tokio runtime")]
    NoRuntime,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
}

/// Read-only view of a session's results, shareable with presentation code.
#[derive(Clone)]
pub struct ReadingHandle {
    log: Arc<Mutex<ResultLog>>,
    coverage: Arc<CoverageTracker>,
}

impl ReadingHandle {
    pub fn is_covering_lens(&self) -> bool {
        self.coverage.is_covered()
    }

    pub fn current(&self) -> Option<BpmSample> {
        self.log.lock().ok().and_then(|log| log.current().cloned())
    }

    pub fn samples(&self) -> Vec<BpmSample> {
        self.log
            .lock()
            .map(|log| log.samples().to_vec())
            .unwrap_or_default()
    }

    pub fn summarize(&self, mode: SummaryMode) -> Option<ReadingSummary> {
        self.log.lock().ok().map(|log| log.summarize(mode))
    }
}

struct RunningSession {
    cancel: CancellationToken,
    ingest: JoinHandle<SamplingRateTracker>,
    publisher: JoinHandle<()>,
    persistence: Option<JoinHandle<()>>,
}

/// Drives one recording session through `Idle -> Sampling -> Stopping -> Finished`.
pub struct PipelineCoordinator {
    identifier: String,
    config: PipelineConfig,
    source: Box<dyn CaptureSource>,
    state: PipelineState,
    log: Arc<Mutex<ResultLog>>,
    coverage: Arc<CoverageTracker>,
    events: broadcast::Sender<PipelineEvent>,
    metrics: Arc<MetricsRecorder>,
    sinks: Option<PersistenceSinks>,
    running: Option<RunningSession>,
    start_date: Option<DateTime<Utc>>,
    logger: LogManager,
}

impl PipelineCoordinator {
    pub fn new(
        identifier: impl Into<String>,
        config: PipelineConfig,
        source: Box<dyn CaptureSource>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            identifier: identifier.into(),
            log: Arc::new(Mutex::new(ResultLog::new(config.min_confidence))),
            config,
            source,
            state: PipelineState::Idle,
            coverage: Arc::new(CoverageTracker::new()),
            events,
            metrics: Arc::new(MetricsRecorder::new()),
            sinks: None,
            running: None,
            start_date: None,
            logger: LogManager::new("coordinator"),
        })
    }

    /// Streams color and BPM rows to `sinks` while sampling.
    pub fn with_persistence(mut self, sinks: PersistenceSinks) -> Self {
        self.sinks = Some(sinks);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn reading_handle(&self) -> ReadingHandle {
        ReadingHandle {
            log: Arc::clone(&self.log),
            coverage: Arc::clone(&self.coverage),
        }
    }

    pub fn is_covering_lens(&self) -> bool {
        self.coverage.is_covered()
    }

    pub fn current(&self) -> Option<BpmSample> {
        self.reading_handle().current()
    }

    pub fn samples(&self) -> Vec<BpmSample> {
        self.reading_handle().samples()
    }

    pub fn summarize(&self, mode: SummaryMode) -> Option<ReadingSummary> {
        self.reading_handle().summarize(mode)
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics.snapshot()
    }

    /// Opens the capture source and spawns the ingest and publish stages on
    /// the current tokio runtime. On failure the pipeline stays idle.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                action: "start",
            });
        }
        let runtime = Handle::try_current().map_err(|_| PipelineError::NoRuntime)?;

        let (tx, rx) = mpsc::channel(self.config.ingest_capacity);
        let sink = SampleSink::new(
            tx,
            LensCoverageClassifier::new(self.config.min_red_level),
            Arc::clone(&self.coverage),
            self.events.clone(),
            Arc::clone(&self.metrics),
        );
        match self.source.open(sink) {
            Ok(()) => {}
            Err(CaptureError::NoDevice) => {
                self.logger.warn("no capture device, staying idle");
                return Err(PipelineError::NoCamera);
            }
            Err(err) => return Err(err.into()),
        }
        self.source.set_illumination(true);

        let (persist_tx, persistence) = match self.sinks.take() {
            Some(sinks) => {
                let capacity = self.config.frame_rate as usize * 4;
                let (persist_tx, persist_rx) = mpsc::channel(capacity);
                let handle = spawn_persistence(
                    sinks,
                    self.config.frame_rate as usize,
                    Arc::clone(&self.metrics),
                    persist_rx,
                );
                (Some(persist_tx), Some(handle))
            }
            None => (None, None),
        };

        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let ingest = IngestStage {
            accumulator: WindowAccumulator::new(self.config.window_len()),
            rate: SamplingRateTracker::new(),
            estimator: Arc::new(HeartRateEstimator::new(self.config.signal_config())),
            workers: Arc::new(Semaphore::new(self.config.compute_workers)),
            pending: pending_tx,
            persist: persist_tx.clone(),
            metrics: Arc::clone(&self.metrics),
            logger: LogManager::new("ingest"),
        };
        let publisher = PublishStage {
            log: Arc::clone(&self.log),
            events: self.events.clone(),
            persist: persist_tx,
            metrics: Arc::clone(&self.metrics),
            logger: LogManager::new("publish"),
        };

        self.running = Some(RunningSession {
            ingest: runtime.spawn(ingest.run(rx, cancel.clone())),
            publisher: runtime.spawn(publisher.run(pending_rx)),
            persistence,
            cancel,
        });
        self.start_date = Some(Utc::now());
        self.logger.record(&format!(
            "session {} sampling at {} fps, window {} samples",
            self.identifier,
            self.config.frame_rate,
            self.config.window_len()
        ));
        self.set_state(PipelineState::Sampling);
        Ok(())
    }

    /// Closes the capture source, drains queued samples and waits up to the
    /// drain timeout for in-flight windows. Windows still computing after that
    /// are abandoned.
    pub async fn stop(&mut self) -> Result<SessionSummary, PipelineError> {
        if self.state != PipelineState::Sampling {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                action: "stop",
            });
        }
        self.set_state(PipelineState::Stopping);
        self.source.set_illumination(false);
        self.source.close();

        if let Some(session) = self.running.take() {
            self.drain(session).await;
        }

        self.set_state(PipelineState::Finished);
        let summary = SessionSummary {
            identifier: self.identifier.clone(),
            start_date: self.start_date.unwrap_or_else(Utc::now),
            end_date: Utc::now(),
            samples: self.samples(),
        };
        self.logger.record(&format!(
            "session {} finished with {} results",
            self.identifier,
            summary.samples.len()
        ));
        Ok(summary)
    }

    async fn drain(&self, session: RunningSession) {
        let timeout = Duration::from_millis(self.config.drain_timeout_ms);
        session.cancel.cancel();

        match session.ingest.await {
            Ok(rate) => self.report_sampling_rate(&rate),
            Err(err) => self.logger.warn(&format!("ingest stage failed: {}", err)),
        }

        let mut publisher = session.publisher;
        if tokio::time::timeout(timeout, &mut publisher).await.is_err() {
            self.logger
                .warn("in-flight windows did not finish before the drain timeout");
            publisher.abort();
        }

        if let Some(mut persistence) = session.persistence {
            if tokio::time::timeout(timeout, &mut persistence).await.is_err() {
                self.logger.warn("persistence did not flush before the drain timeout");
            }
        }
    }

    fn report_sampling_rate(&self, rate: &SamplingRateTracker) {
        let Some(measured) = rate.rate(self.config.min_rate_samples()) else {
            self.logger.trace("too few samples to estimate the sampling rate");
            return;
        };
        let expected = self.config.sample_rate();
        if ((measured - expected) / expected).abs() > RATE_TOLERANCE {
            self.logger.warn(&format!(
                "measured {:.1} fps, configured {:.0} fps",
                measured, expected
            ));
        } else {
            self.logger
                .trace(&format!("measured sampling rate {:.1} fps", measured));
        }
    }

    fn set_state(&mut self, state: PipelineState) {
        self.logger.trace(&format!("{} -> {}", self.state, state));
        self.state = state;
        let _ = self.events.send(PipelineEvent::StateChanged { state });
    }
}
