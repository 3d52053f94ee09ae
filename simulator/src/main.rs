use anyhow::Context;
use clap::Parser;
use generator::profile::build_recording;
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use ppgcore::persist::read_color_samples;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Camera heart-rate pipeline driver")]
struct Args {
    /// Analyze a whole recording in one batch and report each estimate
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Color-sample CSV to analyze instead of a generated recording
    #[arg(long)]
    input: Option<PathBuf>,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Heart rate of the generated pulse
    #[arg(long, default_value_t = 65.0)]
    bpm: f64,
    /// Run a live session against the synthetic camera for this many seconds
    #[arg(long)]
    live: Option<f64>,
    /// Time compression applied to the synthetic camera
    #[arg(long, default_value_t = 1.0)]
    speedup: f64,
    /// Directory receiving color, BPM and summary files of a live session
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Keep the HTTP bridge alive until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.bpm, args.live.unwrap_or(20.0), args.speedup)
    };
    if let Some(seconds) = args.live {
        workflow_config.live_seconds = seconds;
    }

    let runner = Runner::new(workflow_config.clone());
    let gui_bridge = GuiBridge::new(Arc::new(runner.clone()));
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    if args.offline {
        let samples = match &args.input {
            Some(path) => {
                let file =
                    File::open(path).with_context(|| format!("opening {}", path.display()))?;
                read_color_samples(file).with_context(|| format!("reading {}", path.display()))?
            }
            None => build_recording(&workflow_config.generator)?,
        };
        let result = runner.analyze(&samples)?;

        for (index, estimate) in result.estimates.iter().enumerate() {
            println!(
                "window {:>3}: {:>3} bpm  confidence {:.3}",
                index, estimate.bpm, estimate.confidence
            );
        }
        println!(
            "Offline run -> covered samples {}, estimates {}, sampling rate {}",
            result.covered_samples,
            result.estimates.len(),
            result
                .sampling_rate
                .map(|rate| format!("{:.1} fps", rate))
                .unwrap_or_else(|| "unknown".into())
        );

        let report = format!(
            "covered={} estimates={:?}\n",
            result.covered_samples,
            result
                .estimates
                .iter()
                .map(|e| (e.bpm, e.confidence))
                .collect::<Vec<_>>()
        );
        let report_path = PathBuf::from("tools/data/offline_heart_rate.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)?;
        file.write_all(report.as_bytes())?;
    }

    if args.serve {
        let bridge = gui_bridge.clone();
        runtime.spawn(async move { bridge.serve(gui_bind_address()).await });
        gui_bridge.publish_status(&format!("HTTP bridge listening on {}", gui_bind_address()));
    }

    if args.live.is_some() {
        let outcome = runtime.block_on(runner.run_live(args.output_dir.as_deref(), |event| {
            gui_bridge.publish(event);
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(err) => log::warn!("unprintable event: {}", err),
            }
        }))?;
        gui_bridge.publish_summary(&outcome.summary);
        if let Some(reading) = outcome.reading {
            println!(
                "Live run -> {} results, resting bpm {:?} ({:?})",
                outcome.summary.samples.len(),
                reading.bpm,
                reading.source
            );
        }
    }

    if args.serve {
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
