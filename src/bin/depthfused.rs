//! depthfused - depth-fused object detection loop
//!
//! This binary:
//! 1. Loads configuration, class labels, and the detector model
//! 2. Opens the depth+color camera session
//! 3. Runs the synchronous per-frame pipeline (acquire, infer, decode,
//!    suppress, fuse, present) until interrupted
//! 4. Releases the camera on every exit path
//!
//! Fatal configuration errors (missing model, missing labels, no compatible
//! device) are reported here, before the loop starts.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use depthfuse::{detect, CameraSource, ClassLabels, DepthfuseConfig, StdoutPresenter};

#[derive(Parser, Debug)]
#[command(name = "depthfused", about = "Depth-fused object detection loop")]
struct Args {
    /// Detector backend ("stub" or "tract"). Overrides config.
    #[arg(long)]
    backend: Option<String>,

    /// ONNX model path for the tract backend. Overrides config.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Class label file (newline-delimited). Overrides config.
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Camera device spec (e.g. "stub://bench", "realsense://auto").
    /// Overrides config.
    #[arg(long)]
    device: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = DepthfuseConfig::load()?;
    if let Some(backend) = args.backend {
        cfg.detector.backend = backend;
    }
    if let Some(model) = args.model {
        cfg.detector.model_path = Some(model);
    }
    if let Some(labels) = args.labels {
        cfg.detector.labels_path = labels;
    }
    if let Some(device) = args.device {
        cfg.camera.device = device;
    }
    cfg.validate()?;

    let labels = ClassLabels::load(&cfg.detector.labels_path)?;
    log::info!(
        "{} class labels from {}",
        labels.len(),
        cfg.detector.labels_path.display()
    );

    let mut detector = detect::build_backend(&cfg.detector)?;
    let mut source = CameraSource::open(&cfg.camera.camera_config())?;
    let mut presenter = StdoutPresenter::new(labels.clone());

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
        })
        .context("install interrupt handler")?;
    }

    log::info!(
        "depthfused running: device {} via the {} backend, thresholds conf={} iou={}",
        cfg.camera.device,
        cfg.detector.backend,
        cfg.detector.params.conf_threshold,
        cfg.detector.params.iou_threshold
    );

    let stats = depthfuse::run(
        &mut source,
        &mut detector,
        &mut presenter,
        &labels,
        &cfg.detector.params,
        cfg.camera.acquire_timeout,
        &stop,
    )?;

    log::info!(
        "done: {} cycles presented, {} skipped, {} observations",
        stats.cycles,
        stats.skipped,
        stats.observations
    );
    Ok(())
}
