//! Frame containers shared across the pipeline.
//!
//! - `ColorFrame`: interleaved RGB8 pixels plus dimensions.
//! - `DepthFrame`: row-major raw depth samples (sensor units, not meters).
//! - `FramePair`: one synchronized acquisition — color, optional depth, and
//!   the sensor's depth scale.
//!
//! Frames are freshly allocated per acquisition cycle and dropped at cycle
//! end; nothing here is retained across iterations.

use anyhow::{anyhow, Result};

/// Interleaved RGB8 color image.
pub struct ColorFrame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ColorFrame {
    /// Wrap an RGB8 buffer. The buffer length must be exactly
    /// `width * height * 3`.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Raw depth map. Samples are sensor units; multiply by the pair's
/// `depth_scale` to obtain meters.
pub struct DepthFrame {
    samples: Vec<u16>,
    pub width: u32,
    pub height: u32,
}

impl DepthFrame {
    /// Wrap a row-major sample buffer. The buffer length must be exactly
    /// `width * height`.
    pub fn new(samples: Vec<u16>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| anyhow!("depth dimensions overflow"))?;
        if samples.len() != expected {
            return Err(anyhow!(
                "expected {} depth samples for {}x{}, received {}",
                expected,
                width,
                height,
                samples.len()
            ));
        }
        Ok(Self {
            samples,
            width,
            height,
        })
    }

    /// Row-major raw samples.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Raw sample at (x, y).
    ///
    /// Coordinates must be valid indices into this map; callers are
    /// responsible for aligning color and depth resolutions beforehand.
    /// There is no clamping or reprojection here.
    pub fn sample_at(&self, x: u32, y: u32) -> u16 {
        self.samples[(y * self.width + x) as usize]
    }
}

/// One synchronized acquisition from a frame source.
///
/// `depth` is `None` when the source produced a usable color frame without a
/// coherent depth frame; downstream fusion then reports observations without
/// a distance rather than fabricating one.
pub struct FramePair {
    pub color: ColorFrame,
    pub depth: Option<DepthFrame>,
    /// Sensor-specific multiplier converting a raw depth sample to meters.
    pub depth_scale: f32,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
