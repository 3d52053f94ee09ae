use crate::generator::profile::GeneratorConfig;
use crate::gui_bridge::model::BridgeState;
use crate::workflow::runner::Runner;
use log::{info, warn};
use ppgcore::{PipelineEvent, SessionSummary};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use warp::{http::StatusCode, Filter};

pub fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct AnalysisFailed;

impl warp::reject::Reject for AnalysisFailed {}

/// Presentation bridge: keeps the latest reading and serves it over HTTP.
#[derive(Clone)]
pub struct GuiBridge {
    state: Arc<RwLock<BridgeState>>,
    runner: Arc<Runner>,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(BridgeState::default())),
            runner,
        }
    }

    pub fn publish(&self, event: &PipelineEvent) {
        if let Ok(mut guard) = self.state.write() {
            guard.reading.apply(event);
        }
    }

    pub fn publish_summary(&self, summary: &SessionSummary) {
        if let Ok(mut guard) = self.state.write() {
            guard.summary = Some(summary.clone());
        }
    }

    pub fn publish_status(&self, message: &str) {
        info!("[gui] {}", message);
    }

    #[cfg(test)]
    pub fn reading(&self) -> crate::gui_bridge::model::ReadingModel {
        self.state
            .read()
            .map(|guard| guard.reading.clone())
            .unwrap_or_default()
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let reading_route = warp::path("reading")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<BridgeState>>| {
                let reading = state
                    .read()
                    .map(|guard| guard.reading.clone())
                    .unwrap_or_default();
                warp::reply::json(&reading)
            });

        let samples_route = warp::path("samples")
            .and(warp::get())
            .and(state_filter)
            .map(|state: Arc<RwLock<BridgeState>>| {
                let summary = state.read().ok().and_then(|guard| guard.summary.clone());
                match summary {
                    Some(summary) => {
                        warp::reply::with_status(warp::reply::json(&summary), StatusCode::OK)
                    }
                    None => warp::reply::with_status(
                        warp::reply::json(&json!({"status": "no finished session"})),
                        StatusCode::NOT_FOUND,
                    ),
                }
            });

        let analyze_route = warp::path("analyze")
            .and(warp::post())
            .and(warp::body::json())
            .and(runner_filter)
            .and_then(|config: GeneratorConfig, runner: Arc<Runner>| async move {
                match runner.analyze_generated(&config) {
                    Ok(result) => {
                        if let Some(name) = config.description.as_ref() {
                            info!("[gui] {} -> {} estimates", name, result.estimates.len());
                        }
                        Ok::<_, warp::Rejection>(warp::reply::json(&result))
                    }
                    Err(err) => {
                        warn!("analyze error: {:#}", err);
                        Err(warp::reject::custom(AnalysisFailed))
                    }
                }
            });

        reading_route.or(samples_route).or(analyze_route)
    }

    /// Serves the bridge until the process exits.
    pub async fn serve(&self, addr: SocketAddr) {
        warp::serve(self.routes()).run(addr).await;
    }
}
