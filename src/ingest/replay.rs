#![cfg(feature = "ingest-replay")]

//! Recorded-frame replay source.
//!
//! Replays a directory of recorded acquisitions for deterministic offline
//! runs: one JPEG color frame per cycle (`NNNN.jpg`, lexicographic order),
//! with an optional sibling raw depth file (`NNNN.depth`, little-endian u16
//! samples at the color frame's resolution). Cycles without a depth file
//! flow through the pipeline with an absent distance on every observation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::frame::{ColorFrame, DepthFrame, FramePair};
use crate::ingest::FrameSource;

/// Configuration for a replay source.
#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Directory holding the recorded frames.
    pub dir: PathBuf,
    /// Depth scale the recording was captured with.
    pub depth_scale: f32,
    /// Restart from the first frame after the last.
    pub loop_playback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::new(),
            depth_scale: 0.001,
            loop_playback: false,
        }
    }
}

/// Recorded-frame replay source.
pub struct ReplaySource {
    config: ReplayConfig,
    frames: Vec<PathBuf>,
    next_index: usize,
    closed: bool,
}

impl ReplaySource {
    /// Scan the recording directory. Fails when it holds no color frames;
    /// that is a startup configuration error.
    pub fn open(config: ReplayConfig) -> Result<Self> {
        let mut frames: Vec<PathBuf> = std::fs::read_dir(&config.dir)
            .with_context(|| format!("failed to read replay dir {}", config.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map(|ext| ext == "jpg").unwrap_or(false))
            .collect();
        frames.sort();
        if frames.is_empty() {
            return Err(anyhow!(
                "replay dir {} contains no .jpg color frames",
                config.dir.display()
            ));
        }
        log::info!(
            "ReplaySource: {} frames from {}",
            frames.len(),
            config.dir.display()
        );
        Ok(Self {
            config,
            frames,
            next_index: 0,
            closed: false,
        })
    }

    fn load_pair(&self, color_path: &Path) -> Result<FramePair> {
        let decoded = image::open(color_path)
            .with_context(|| format!("failed to decode {}", color_path.display()))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        let color = ColorFrame::new(decoded.into_raw(), width, height)?;

        let depth_path = color_path.with_extension("depth");
        let depth = if depth_path.exists() {
            Some(load_depth(&depth_path, width, height)?)
        } else {
            None
        };

        Ok(FramePair {
            color,
            depth,
            depth_scale: self.config.depth_scale,
        })
    }
}

impl FrameSource for ReplaySource {
    fn next_frames(&mut self, _timeout: Duration) -> Result<Option<FramePair>> {
        if self.closed {
            return Err(anyhow!("replay session is closed"));
        }
        if self.next_index >= self.frames.len() {
            if !self.config.loop_playback {
                return Ok(None);
            }
            self.next_index = 0;
        }
        let pair = self.load_pair(&self.frames[self.next_index])?;
        self.next_index += 1;
        Ok(Some(pair))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Raw little-endian u16 samples at the color frame's resolution.
fn load_depth(path: &Path, width: u32, height: u32) -> Result<DepthFrame> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read depth file {}", path.display()))?;
    if bytes.len() % 2 != 0 {
        return Err(anyhow!(
            "depth file {} has an odd byte count",
            path.display()
        ));
    }
    let samples: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    DepthFrame::new(samples, width, height)
        .with_context(|| format!("depth file {} does not match the color resolution", path.display()))
}
