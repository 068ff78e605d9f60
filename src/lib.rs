//! Depth-fused object detection.
//!
//! This crate fuses a single-pass object detector with a depth sensor: for
//! each detected object it reports the 2D bounding box, class label,
//! confidence, and physical distance from the camera.
//!
//! # Architecture
//!
//! One synchronous loop per camera, no tracking across frames:
//!
//! 1. **Acquire** a synchronized depth+color pair (transient misses skip the
//!    cycle).
//! 2. **Infer**: an opaque detector backend maps the color frame to raw
//!    per-cell prediction rows.
//! 3. **Decode**: threshold and convert rows into pixel-space candidate
//!    boxes.
//! 4. **Suppress**: greedy NMS across all classes.
//! 5. **Fuse**: sample the depth map at each survivor's anchor pixel and
//!    scale to meters.
//! 6. **Present**: hand the labeled, distance-annotated observations to the
//!    rendering sink.
//!
//! # Module Structure
//!
//! - `frame`: frame containers (ColorFrame, DepthFrame, FramePair)
//! - `ingest`: frame sources (depth camera, replay, synthetic stub)
//! - `detect`: detector backends (stub, tract ONNX)
//! - `decode`, `nms`, `fuse`: the per-frame core
//! - `labels`, `config`: startup configuration
//! - `pipeline`: the loop
//! - `present`: presenter boundary

pub mod config;
pub mod decode;
pub mod detect;
pub mod frame;
pub mod fuse;
pub mod ingest;
pub mod labels;
pub mod nms;
pub mod pipeline;
pub mod present;

pub use config::{CameraSettings, DepthfuseConfig, DetectionParams, DetectorSettings};
pub use decode::{decode, CandidateBox, PixelRect};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use detect::{DetectorBackend, RawPrediction, StubBackend};
pub use frame::{ColorFrame, DepthFrame, FramePair};
pub use fuse::{fuse, Observation};
#[cfg(feature = "ingest-replay")]
pub use ingest::{ReplayConfig, ReplaySource};
pub use ingest::{CameraConfig, CameraSource, CameraStats, FrameSource};
pub use labels::ClassLabels;
pub use nms::{iou, suppress};
pub use pipeline::{run, run_once, RunStats};
pub use present::{DepthPreview, Presenter, StdoutPresenter, DEPTH_PREVIEW_ALPHA};
