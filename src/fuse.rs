//! Depth-lookup fusion.
//!
//! Maps each suppressed detection's anchor pixel (box center) to a physical
//! distance: one raw sample from the depth map, scaled by the sensor's depth
//! scale. When the cycle carried no depth frame the distance is absent — it
//! is never fabricated as zero or carried over from an earlier frame.

use serde::Serialize;

use crate::decode::{CandidateBox, PixelRect};
use crate::frame::DepthFrame;

/// Terminal data product of the pipeline: a suppressed detection with its
/// anchor pixel and, when depth was available, a physical distance in meters.
#[derive(Clone, Debug, Serialize)]
pub struct Observation {
    pub class_id: usize,
    pub confidence: f32,
    pub rect: PixelRect,
    /// Anchor pixel sampled for depth: the box center.
    pub anchor_x: i32,
    pub anchor_y: i32,
    /// Absent when no coherent depth frame accompanied the color frame.
    pub distance_m: Option<f32>,
}

/// Fuse the suppressed candidates with the depth map.
///
/// `kept` holds indices into `candidates` as returned by suppression; the
/// surviving geometry passes through unchanged. Anchor coordinates are
/// assumed to be valid indices into `depth` — streams of differing
/// resolutions must be aligned before this point, there is no clamping here.
pub fn fuse(
    candidates: &[CandidateBox],
    kept: &[usize],
    depth: Option<&DepthFrame>,
    depth_scale: f32,
) -> Vec<Observation> {
    kept.iter()
        .map(|&i| {
            let cand = &candidates[i];
            let anchor_x = (cand.rect.left as f32 + cand.rect.width as f32 / 2.0) as i32;
            let anchor_y = (cand.rect.top as f32 + cand.rect.height as f32 / 2.0) as i32;
            let distance_m = depth.map(|map| {
                depth_scale * map.sample_at(anchor_x as u32, anchor_y as u32) as f32
            });
            Observation {
                class_id: cand.class_id,
                confidence: cand.confidence,
                rect: cand.rect,
                anchor_x,
                anchor_y,
                distance_m,
            }
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
