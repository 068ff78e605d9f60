//! detect_once - single-cycle detection tool
//!
//! Acquires one coherent frame pair, runs one pipeline pass, and prints the
//! observations as JSON to stdout. Useful for smoke-testing a camera/model
//! pairing without starting the full loop.

use anyhow::Result;
use clap::Parser;

use depthfuse::{detect, pipeline, CameraSource, ClassLabels, DepthfuseConfig};

#[derive(Parser, Debug)]
#[command(name = "detect_once", about = "Run one detection cycle, print JSON")]
struct Args {
    /// Transient-miss retries before giving up.
    #[arg(long, default_value_t = 10)]
    attempts: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let cfg = DepthfuseConfig::load()?;
    let labels = ClassLabels::load(&cfg.detector.labels_path)?;
    let mut detector = detect::build_backend(&cfg.detector)?;
    let mut source = CameraSource::open(&cfg.camera.camera_config())?;

    let observations = pipeline::run_once(
        &mut source,
        &mut detector,
        &labels,
        &cfg.detector.params,
        cfg.camera.acquire_timeout,
        args.attempts,
    )?;

    let rows: Vec<_> = observations
        .iter()
        .map(|obs| {
            serde_json::json!({
                "label": labels.get(obs.class_id).unwrap_or("?"),
                "class_id": obs.class_id,
                "confidence": obs.confidence,
                "box": obs.rect,
                "anchor": [obs.anchor_x, obs.anchor_y],
                "distance_m": obs.distance_m,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
