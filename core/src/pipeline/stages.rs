//! Ingest, compute and publish stages of a running session.

use crate::persist::PersistRecord;
use crate::pipeline::events::PipelineEvent;
use crate::prelude::{HeartRateEstimate, StageError, StageResult};
use crate::processing::HeartRateEstimator;
use crate::records::{BpmSample, ColorSample};
use crate::results::ResultLog;
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::window::{AnalysisWindow, SamplingRateTracker, WindowAccumulator};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, oneshot, Semaphore};
use tokio_util::sync::CancellationToken;

/// A classified sample on its way from the capture stage to ingest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ingested {
    pub sample: ColorSample,
    pub covered: bool,
}

type EstimateResult = StageResult<Option<HeartRateEstimate>>;

/// A dispatched window whose estimate may still be computing.
#[derive(Debug)]
pub(crate) struct PendingEstimate {
    pub sequence: u64,
    pub uptime: f64,
    pub result: oneshot::Receiver<EstimateResult>,
}

pub(crate) struct IngestStage {
    pub accumulator: WindowAccumulator,
    pub rate: SamplingRateTracker,
    pub estimator: Arc<HeartRateEstimator>,
    pub workers: Arc<Semaphore>,
    pub pending: mpsc::UnboundedSender<PendingEstimate>,
    pub persist: Option<mpsc::Sender<PersistRecord>>,
    pub metrics: Arc<MetricsRecorder>,
    pub logger: LogManager,
}

impl IngestStage {
    /// Consumes samples in arrival order until cancelled, then drains what is
    /// already queued. Returns the sampling-rate tracker for the session.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<Ingested>,
        cancel: CancellationToken,
    ) -> SamplingRateTracker {
        loop {
            tokio::select! {
                item = rx.recv() => match item {
                    Some(item) => self.ingest(item).await,
                    None => break,
                },
                _ = cancel.cancelled() => {
                    rx.close();
                    while let Ok(item) = rx.try_recv() {
                        self.ingest(item).await;
                    }
                    break;
                }
            }
        }
        self.logger.record(&format!(
            "ingest finished after {} windows",
            self.accumulator.emitted()
        ));
        self.rate
    }

    async fn ingest(&mut self, item: Ingested) {
        self.rate.observe(&item.sample, item.covered);
        if let Some(persist) = &self.persist {
            if persist.send(PersistRecord::Color(item.sample)).await.is_err() {
                self.metrics.record_persistence_error();
            }
        }

        if !item.covered {
            return;
        }
        if let Some(window) = self.accumulator.push(item.sample) {
            self.dispatch(window);
        }
    }

    fn dispatch(&mut self, window: AnalysisWindow) {
        self.metrics.record_window();
        self.logger.trace(&format!(
            "window {} ready at {:.2}s",
            window.sequence, window.uptime
        ));

        let (tx, rx) = oneshot::channel();
        let pending = PendingEstimate {
            sequence: window.sequence,
            uptime: window.uptime,
            result: rx,
        };
        let estimator = Arc::clone(&self.estimator);
        let workers = Arc::clone(&self.workers);
        tokio::spawn(async move {
            let Ok(_permit) = workers.acquire_owned().await else {
                return;
            };
            let result = tokio::task::spawn_blocking(move || estimator.estimate(&window.channel))
                .await
                .unwrap_or_else(|err| Err(StageError::Internal(format!("compute task: {}", err))));
            // The publisher may already be gone after a stop timeout.
            let _ = tx.send(result);
        });

        if self.pending.send(pending).is_err() {
            self.logger.trace("publisher closed, window abandoned");
        }
    }
}

pub(crate) struct PublishStage {
    pub log: Arc<Mutex<ResultLog>>,
    pub events: broadcast::Sender<PipelineEvent>,
    pub persist: Option<mpsc::Sender<PersistRecord>>,
    pub metrics: Arc<MetricsRecorder>,
    pub logger: LogManager,
}

impl PublishStage {
    /// Appends estimates to the result log in window order.
    pub async fn run(self, mut pending: mpsc::UnboundedReceiver<PendingEstimate>) {
        while let Some(job) = pending.recv().await {
            match job.result.await {
                Ok(Ok(Some(estimate))) => self.publish(job.sequence, job.uptime, estimate).await,
                Ok(Ok(None)) => {}
                Ok(Err(err)) => self
                    .logger
                    .warn(&format!("window {} failed: {}", job.sequence, err)),
                Err(_) => self
                    .logger
                    .warn(&format!("window {} abandoned by its worker", job.sequence)),
            }
        }
    }

    async fn publish(&self, sequence: u64, uptime: f64, estimate: HeartRateEstimate) {
        let sample = BpmSample::from_estimate(uptime, estimate);
        let advanced = match self.log.lock() {
            Ok(mut log) => log.append(sample.clone()),
            Err(_) => {
                self.logger.warn("result log poisoned, dropping estimate");
                return;
            }
        };
        self.metrics.record_published();
        self.logger.record(&format!(
            "window {} at {:.2}s: {} bpm, confidence {:.3}",
            sequence, uptime, estimate.bpm, estimate.confidence
        ));

        if advanced {
            if let Some(bpm) = sample.bpm {
                let _ = self.events.send(PipelineEvent::CurrentBpm {
                    uptime,
                    bpm,
                    confidence: estimate.confidence,
                });
            }
        }

        if let Some(persist) = &self.persist {
            if persist.send(PersistRecord::Bpm(sample)).await.is_err() {
                self.metrics.record_persistence_error();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher() -> (
        PublishStage,
        Arc<Mutex<ResultLog>>,
        broadcast::Receiver<PipelineEvent>,
    ) {
        let log = Arc::new(Mutex::new(ResultLog::new(0.5)));
        let (events, rx) = broadcast::channel(16);
        let stage = PublishStage {
            log: Arc::clone(&log),
            events,
            persist: None,
            metrics: Arc::new(MetricsRecorder::new()),
            logger: LogManager::new("publish"),
        };
        (stage, log, rx)
    }

    fn pending(sequence: u64, uptime: f64) -> (oneshot::Sender<EstimateResult>, PendingEstimate) {
        let (tx, rx) = oneshot::channel();
        let job = PendingEstimate {
            sequence,
            uptime,
            result: rx,
        };
        (tx, job)
    }

    fn estimate(bpm: i32, confidence: f64) -> EstimateResult {
        Ok(Some(HeartRateEstimate { bpm, confidence }))
    }

    #[tokio::test]
    async fn later_window_finishing_first_is_published_in_window_order() {
        let (stage, log, mut events) = publisher();
        let (jobs, queue) = mpsc::unbounded_channel();
        let (first_tx, first) = pending(0, 5.0);
        let (second_tx, second) = pending(1, 10.0);
        jobs.send(first).unwrap();
        jobs.send(second).unwrap();
        drop(jobs);

        let task = tokio::spawn(stage.run(queue));
        second_tx.send(estimate(70, 0.8)).unwrap();
        tokio::task::yield_now().await;
        assert!(log.lock().unwrap().is_empty());

        first_tx.send(estimate(65, 0.7)).unwrap();
        task.await.unwrap();

        let samples = log.lock().unwrap().samples().to_vec();
        let order: Vec<_> = samples.iter().map(|s| (s.uptime, s.bpm)).collect();
        assert_eq!(order, vec![(5.0, Some(65)), (10.0, Some(70))]);

        let published: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|event| match event {
                PipelineEvent::CurrentBpm { bpm, .. } => Some(bpm),
                _ => None,
            })
            .collect();
        assert_eq!(published, vec![65, 70]);
    }

    #[tokio::test]
    async fn failed_and_abandoned_windows_do_not_stall_later_ones() {
        let (stage, log, _events) = publisher();
        let (jobs, queue) = mpsc::unbounded_channel();
        let (abandoned_tx, abandoned) = pending(0, 5.0);
        let (failed_tx, failed) = pending(1, 10.0);
        let (ok_tx, ok) = pending(2, 15.0);
        for job in [abandoned, failed, ok] {
            jobs.send(job).unwrap();
        }
        drop(jobs);

        drop(abandoned_tx);
        failed_tx
            .send(Err(StageError::InvalidInput("too short".into())))
            .unwrap();
        ok_tx.send(estimate(72, 0.9)).unwrap();
        stage.run(queue).await;

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.samples()[0].uptime, 15.0);
    }

    #[tokio::test]
    async fn publisher_aborted_while_a_window_is_pending_leaves_earlier_results() {
        let (stage, log, _events) = publisher();
        let (jobs, queue) = mpsc::unbounded_channel();
        let (done_tx, done) = pending(0, 5.0);
        let (_stuck_tx, stuck) = pending(1, 10.0);
        jobs.send(done).unwrap();
        jobs.send(stuck).unwrap();
        done_tx.send(estimate(66, 0.7)).unwrap();

        let mut task = tokio::spawn(stage.run(queue));
        let waited = tokio::time::timeout(std::time::Duration::from_millis(20), &mut task).await;
        assert!(waited.is_err());
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert_eq!(log.lock().unwrap().len(), 1);
        drop(jobs);
    }
}
