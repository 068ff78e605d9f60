#![cfg(feature = "camera-realsense")]

//! RealSense camera backend.
//!
//! Negotiates one depth stream and one color stream on a connected RealSense
//! device and yields synchronized pairs. Stream selection follows the device
//! product line: L500 units stream color at 960x540, everything else at the
//! configured color resolution. The sensor's depth scale is read once at
//! open and attached to every pair.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use realsense_rust::{
    config::Config,
    context::Context,
    frame::{ColorFrame as RsColorFrame, DepthFrame as RsDepthFrame, PixelKind},
    kind::{Rs2CameraInfo, Rs2Format, Rs2Option, Rs2ProductLine, Rs2StreamKind},
    pipeline::{ActivePipeline, InactivePipeline},
};

use crate::frame::{ColorFrame, DepthFrame, FramePair};
use crate::ingest::camera::{CameraConfig, CameraStats};

/// Fallback when the depth sensor does not expose its units option.
const DEFAULT_DEPTH_SCALE: f32 = 0.001;

pub(crate) struct RealsenseCamera {
    pipeline: Option<ActivePipeline>,
    depth_scale: f32,
    device: String,
    frame_count: u64,
}

impl RealsenseCamera {
    pub(crate) fn open(config: &CameraConfig) -> Result<Self> {
        let context = Context::new().context("initialize RealSense context")?;
        let devices = context.query_devices(HashSet::new());
        let device = devices
            .first()
            .ok_or_else(|| anyhow!("no RealSense device connected"))?;

        // The pipeline needs a depth camera that also carries a color sensor.
        let has_rgb = device.sensors().iter().any(|sensor| {
            sensor
                .info(Rs2CameraInfo::Name)
                .map(|name| name.to_str().unwrap_or("") == "RGB Camera")
                .unwrap_or(false)
        });
        if !has_rgb {
            return Err(anyhow!(
                "no compatible device: a depth camera with a color sensor is required"
            ));
        }

        let product_line = device
            .info(Rs2CameraInfo::ProductLine)
            .and_then(|s| s.to_str().ok())
            .unwrap_or("")
            .to_string();

        let depth_scale = device
            .sensors()
            .iter()
            .find_map(|sensor| sensor.get_option(Rs2Option::DepthUnits))
            .unwrap_or(DEFAULT_DEPTH_SCALE);

        let (color_width, color_height) = if product_line == "L500" {
            (960, 540)
        } else {
            (config.color_width as usize, config.color_height as usize)
        };

        let mut stream_config = Config::new();
        stream_config
            .enable_stream(
                Rs2StreamKind::Depth,
                None,
                config.depth_width as usize,
                config.depth_height as usize,
                Rs2Format::Z16,
                config.fps as usize,
            )
            .context("enable depth stream")?
            .enable_stream(
                Rs2StreamKind::Color,
                None,
                color_width,
                color_height,
                Rs2Format::Bgr8,
                config.fps as usize,
            )
            .context("enable color stream")?;

        let pipeline = InactivePipeline::try_from(&context)
            .context("create RealSense pipeline")?
            .start(Some(stream_config))
            .context("start RealSense streaming")?;

        log::info!(
            "CameraSource: opened {} (product line {}, depth scale {})",
            config.device,
            product_line,
            depth_scale
        );

        Ok(Self {
            pipeline: Some(pipeline),
            depth_scale,
            device: config.device.clone(),
            frame_count: 0,
        })
    }

    pub(crate) fn next_frames(&mut self, timeout: Duration) -> Result<Option<FramePair>> {
        let pipeline = self
            .pipeline
            .as_mut()
            .ok_or_else(|| anyhow!("RealSense pipeline is stopped"))?;

        // Stalls and incoherent composites are transient misses, not errors;
        // the pipeline skips the cycle and retries.
        let frames = match pipeline.wait(Some(timeout)) {
            Ok(frames) => frames,
            Err(e) => {
                log::debug!("RealSense wait yielded no frames: {}", e);
                return Ok(None);
            }
        };

        let depth_frames = frames.frames_of_type::<RsDepthFrame>();
        let color_frames = frames.frames_of_type::<RsColorFrame>();
        let (Some(depth_frame), Some(color_frame)) = (depth_frames.first(), color_frames.first())
        else {
            return Ok(None);
        };

        let color = convert_color(color_frame)?;
        let depth = convert_depth(depth_frame)?;
        self.frame_count += 1;

        Ok(Some(FramePair {
            color,
            depth: Some(depth),
            depth_scale: self.depth_scale,
        }))
    }

    pub(crate) fn close(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            drop(pipeline);
            log::info!("CameraSource: closed {}", self.device);
        }
    }

    pub(crate) fn stats(&self) -> CameraStats {
        CameraStats {
            frames_produced: self.frame_count,
            device: self.device.clone(),
        }
    }
}

fn convert_color(frame: &RsColorFrame) -> Result<ColorFrame> {
    let width = frame.width() as u32;
    let height = frame.height() as u32;
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for pixel in frame.iter() {
        match pixel {
            PixelKind::Bgr8 { b, g, r } => {
                pixels.push(*r);
                pixels.push(*g);
                pixels.push(*b);
            }
            other => return Err(anyhow!("unexpected color pixel format: {:?}", other)),
        }
    }
    ColorFrame::new(pixels, width, height)
}

fn convert_depth(frame: &RsDepthFrame) -> Result<DepthFrame> {
    let width = frame.width() as u32;
    let height = frame.height() as u32;
    let mut samples = Vec::with_capacity((width * height) as usize);
    for pixel in frame.iter() {
        match pixel {
            PixelKind::Z16 { depth } => samples.push(*depth),
            other => return Err(anyhow!("unexpected depth pixel format: {:?}", other)),
        }
    }
    DepthFrame::new(samples, width, height)
}
