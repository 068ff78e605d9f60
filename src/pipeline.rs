//! Per-frame pipeline loop.
//!
//! One thread, one tight synchronous cycle: acquire → infer → decode →
//! suppress → fuse → present. No frame is buffered or re-processed, and
//! nothing mutable crosses iterations — every cycle's candidates and
//! observations are freshly allocated and dropped at cycle end.
//!
//! A transient acquisition miss skips the cycle entirely (no decoding, no
//! fusion) and retries immediately; that is the only retry policy here.
//! Cancellation is cooperative: the stop flag is checked once per iteration,
//! after presentation, so in-flight work is never interrupted mid-step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::config::DetectionParams;
use crate::decode::decode;
use crate::detect::DetectorBackend;
use crate::frame::FramePair;
use crate::fuse::{fuse, Observation};
use crate::ingest::FrameSource;
use crate::labels::ClassLabels;
use crate::nms::suppress;
use crate::present::{DepthPreview, Presenter, DEPTH_PREVIEW_ALPHA};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Counters for a finished run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunStats {
    /// Cycles that produced a coherent frame pair and were presented.
    pub cycles: u64,
    /// Cycles skipped on a transient acquisition miss.
    pub skipped: u64,
    /// Total observations handed to the presenter.
    pub observations: u64,
}

/// Run the pipeline until the stop flag is raised or a fatal error occurs.
///
/// The source is closed on every exit path — normal stop, fatal error, or
/// label-table mismatch — before this function returns.
pub fn run<S, D, P>(
    source: &mut S,
    detector: &mut D,
    presenter: &mut P,
    labels: &ClassLabels,
    params: &DetectionParams,
    acquire_timeout: Duration,
    stop: &AtomicBool,
) -> Result<RunStats>
where
    S: FrameSource,
    D: DetectorBackend,
    P: Presenter,
{
    let outcome = drive(source, detector, presenter, labels, params, acquire_timeout, stop);
    source.close();
    outcome
}

fn drive<S, D, P>(
    source: &mut S,
    detector: &mut D,
    presenter: &mut P,
    labels: &ClassLabels,
    params: &DetectionParams,
    acquire_timeout: Duration,
    stop: &AtomicBool,
) -> Result<RunStats>
where
    S: FrameSource,
    D: DetectorBackend,
    P: Presenter,
{
    let mut stats = RunStats::default();
    let mut last_health_log = Instant::now();

    loop {
        match source.next_frames(acquire_timeout)? {
            None => {
                stats.skipped += 1;
                log::debug!("no coherent frame pair; skipping cycle");
            }
            Some(pair) => {
                let observations = process_pair(&pair, detector, labels, params)?;
                let preview = pair
                    .depth
                    .as_ref()
                    .map(|depth| DepthPreview::from_depth(depth, DEPTH_PREVIEW_ALPHA));
                if let Err(e) = presenter.render(&pair.color, &observations, preview.as_ref()) {
                    log::warn!("presenter failed: {}", e);
                }
                stats.cycles += 1;
                stats.observations += observations.len() as u64;
            }
        }

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            log::info!(
                "pipeline health: {} cycles, {} skipped, {} observations",
                stats.cycles,
                stats.skipped,
                stats.observations
            );
            last_health_log = Instant::now();
        }

        if stop.load(Ordering::Relaxed) {
            log::info!("stop requested; leaving pipeline loop");
            break;
        }
    }

    Ok(stats)
}

/// Run one acquisition cycle and return its observations.
///
/// Transient misses are retried up to `max_attempts` times; running out of
/// attempts is an error here because the caller asked for exactly one
/// result. The source is closed before returning.
pub fn run_once<S, D>(
    source: &mut S,
    detector: &mut D,
    labels: &ClassLabels,
    params: &DetectionParams,
    acquire_timeout: Duration,
    max_attempts: u32,
) -> Result<Vec<Observation>>
where
    S: FrameSource,
    D: DetectorBackend,
{
    let outcome = (|| {
        for _ in 0..max_attempts {
            if let Some(pair) = source.next_frames(acquire_timeout)? {
                return process_pair(&pair, detector, labels, params);
            }
        }
        Err(anyhow!(
            "no coherent frame pair after {} attempts",
            max_attempts
        ))
    })();
    source.close();
    outcome
}

/// decode → suppress → fuse → label-consistency check for one frame pair.
fn process_pair<D>(
    pair: &FramePair,
    detector: &mut D,
    labels: &ClassLabels,
    params: &DetectionParams,
) -> Result<Vec<Observation>>
where
    D: DetectorBackend,
{
    let predictions = detector.infer(&pair.color)?;
    let candidates = decode(
        &predictions,
        pair.color.width,
        pair.color.height,
        params.conf_threshold,
    );
    let kept = suppress(&candidates, params.conf_threshold, params.iou_threshold);
    let observations = fuse(&candidates, &kept, pair.depth.as_ref(), pair.depth_scale);

    // An out-of-range class id means the model and label file do not match.
    // That is a fatal consistency fault, never silently ignored.
    for obs in &observations {
        labels.require(obs.class_id)?;
    }

    log::debug!(
        "{} predictions, {} candidates, {} kept",
        predictions.len(),
        candidates.len(),
        observations.len()
    );
    Ok(observations)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
