//! Frame acquisition sources.
//!
//! This module provides sources for synchronized depth+color frame pairs:
//! - Depth camera devices (feature: camera-realsense), with a synthetic
//!   backend selected by `stub://` device specs for tests and bench runs
//! - Recorded frame replay (feature: ingest-replay)
//!
//! All sources implement [`FrameSource`]: acquisition blocks up to a timeout
//! and yields either a coherent [`FramePair`] or `None` for a transient miss.
//! A miss is not an error — the pipeline skips the cycle and retries.
//!
//! Sources own the camera handle; `close` releases it and is idempotent, and
//! sources also release on drop so teardown happens on every exit path.

use std::time::Duration;

use anyhow::Result;

use crate::frame::FramePair;

mod camera;
#[cfg(feature = "camera-realsense")]
pub(crate) mod realsense;
#[cfg(feature = "ingest-replay")]
pub mod replay;

pub use camera::{CameraConfig, CameraSource, CameraStats};
#[cfg(feature = "ingest-replay")]
pub use replay::{ReplayConfig, ReplaySource};

/// A source of synchronized depth+color acquisitions.
///
/// The camera behind this trait is an opaque capability; recorded or
/// synthetic data substitutes for live hardware without the pipeline
/// noticing.
pub trait FrameSource {
    /// Block up to `timeout` for the next coherent frame pair.
    ///
    /// `Ok(None)` is a transient miss (no coherent depth+color pair this
    /// cycle); the caller skips the cycle and retries. Errors are
    /// non-transient source failures.
    fn next_frames(&mut self, timeout: Duration) -> Result<Option<FramePair>>;

    /// Release the underlying device. Idempotent.
    fn close(&mut self);
}
