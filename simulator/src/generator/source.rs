use crate::generator::profile::{synthetic_sample, GeneratorConfig};
use log::debug;
use ppgcore::pipeline::{CaptureError, CaptureSource, DeliveryStatus, SampleSink};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Stand-in for a torch-lit camera: emits fabricated frames on a timer,
/// uncovered for the settle period and covered afterwards.
pub struct SyntheticSource {
    config: GeneratorConfig,
    speedup: f64,
    torch: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    pub fn new(config: GeneratorConfig, speedup: f64) -> Self {
        Self {
            config,
            speedup: if speedup > 0.0 { speedup } else { 1.0 },
            torch: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    #[cfg(test)]
    pub fn torch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.torch)
    }
}

impl CaptureSource for SyntheticSource {
    fn open(&mut self, sink: SampleSink) -> Result<(), CaptureError> {
        if !self.config.device_present {
            return Err(CaptureError::NoDevice);
        }
        let runtime = Handle::try_current()
            .map_err(|err| CaptureError::Device(format!("no timer runtime: {}", err)))?;

        let config = self.config.clone();
        let torch = Arc::clone(&self.torch);
        let period = Duration::from_secs_f64(1.0 / (config.sample_rate() * self.speedup));
        self.task = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            let mut rng = StdRng::seed_from_u64(config.seed);
            let settle = config.settle_frames();

            for index in 0.. {
                ticker.tick().await;
                let Some(sample) = synthetic_sample(&config, index, index >= settle, &mut rng)
                else {
                    break;
                };
                let delivery = sink.deliver(sample);
                if delivery.illumination_required {
                    torch.store(true, Ordering::Release);
                }
                if delivery.status == DeliveryStatus::Closed {
                    debug!("synthetic camera stopped at frame {}", index);
                    break;
                }
            }
        }));
        Ok(())
    }

    fn set_illumination(&mut self, enabled: bool) {
        self.torch.store(enabled, Ordering::Release);
    }

    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
