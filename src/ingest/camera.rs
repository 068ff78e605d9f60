//! Depth camera source.
//!
//! `CameraSource` owns the device session for one depth+color camera. The
//! backend is chosen from the device spec: `stub://` specs select a
//! deterministic synthetic backend (tests, bench runs), anything else
//! requires the `camera-realsense` feature and a connected device.

use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::frame::{ColorFrame, DepthFrame, FramePair};
use crate::ingest::FrameSource;

/// Raw depth value produced by the synthetic backend.
pub const SYNTHETIC_DEPTH_RAW: u16 = 1000;
/// Depth scale reported by the synthetic backend (raw 1000 reads as 1.0 m).
pub const SYNTHETIC_DEPTH_SCALE: f32 = 0.001;

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device spec (e.g. "stub://bench" or "realsense://auto").
    pub device: String,
    /// Color stream dimensions.
    pub color_width: u32,
    pub color_height: u32,
    /// Depth stream dimensions.
    pub depth_width: u32,
    pub depth_height: u32,
    /// Requested stream rate.
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://bench".to_string(),
            color_width: 640,
            color_height: 480,
            depth_width: 640,
            depth_height: 480,
            fps: 30,
        }
    }
}

/// Depth+color camera source.
pub struct CameraSource {
    backend: CameraBackend,
    closed: bool,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "camera-realsense")]
    Realsense(crate::ingest::realsense::RealsenseCamera),
}

impl CameraSource {
    /// Open a device session.
    ///
    /// Fails when no compatible depth+color device matches the spec; this is
    /// a startup configuration error, reported before any loop runs.
    pub fn open(config: &CameraConfig) -> Result<Self> {
        if config.device.starts_with("stub://") {
            return Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::open(config.clone())),
                closed: false,
            });
        }
        #[cfg(feature = "camera-realsense")]
        {
            Ok(Self {
                backend: CameraBackend::Realsense(crate::ingest::realsense::RealsenseCamera::open(
                    config,
                )?),
                closed: false,
            })
        }
        #[cfg(not(feature = "camera-realsense"))]
        {
            Err(anyhow!(
                "device '{}' requires the camera-realsense feature",
                config.device
            ))
        }
    }

    /// Acquisition statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.stats(),
            #[cfg(feature = "camera-realsense")]
            CameraBackend::Realsense(camera) => camera.stats(),
        }
    }
}

impl FrameSource for CameraSource {
    fn next_frames(&mut self, timeout: Duration) -> Result<Option<FramePair>> {
        if self.closed {
            return Err(anyhow!("camera session is closed"));
        }
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.next_frames(timeout),
            #[cfg(feature = "camera-realsense")]
            CameraBackend::Realsense(camera) => camera.next_frames(timeout),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.close(),
            #[cfg(feature = "camera-realsense")]
            CameraBackend::Realsense(camera) => camera.close(),
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_produced: u64,
    pub device: String,
}

// ----------------------------------------------------------------------------
// Synthetic camera (stub://) for tests and bench runs
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
}

impl SyntheticCamera {
    fn open(config: CameraConfig) -> Self {
        log::info!("CameraSource: opened {} (synthetic)", config.device);
        Self {
            config,
            frame_count: 0,
        }
    }

    fn next_frames(&mut self, _timeout: Duration) -> Result<Option<FramePair>> {
        self.frame_count += 1;

        let color = ColorFrame::new(
            self.generate_color_pixels(),
            self.config.color_width,
            self.config.color_height,
        )?;
        let depth_samples =
            vec![SYNTHETIC_DEPTH_RAW; (self.config.depth_width * self.config.depth_height) as usize];
        let depth = DepthFrame::new(
            depth_samples,
            self.config.depth_width,
            self.config.depth_height,
        )?;

        Ok(Some(FramePair {
            color,
            depth: Some(depth),
            depth_scale: SYNTHETIC_DEPTH_SCALE,
        }))
    }

    /// Deterministic scene pattern: varies with position and frame count so
    /// consecutive frames differ.
    fn generate_color_pixels(&self) -> Vec<u8> {
        let pixel_count = (self.config.color_width * self.config.color_height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }
        pixels
    }

    fn close(&mut self) {
        log::info!("CameraSource: closed {} (synthetic)", self.config.device);
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_produced: self.frame_count,
            device: self.config.device.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
