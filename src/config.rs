use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_LABELS_PATH: &str = "coco.names";
const DEFAULT_CONF_THRESHOLD: f32 = 0.5;
const DEFAULT_IOU_THRESHOLD: f32 = 0.4;
const DEFAULT_INPUT_WIDTH: u32 = 416;
const DEFAULT_INPUT_HEIGHT: u32 = 416;
const DEFAULT_DEVICE: &str = "stub://bench";
const DEFAULT_STREAM_WIDTH: u32 = 640;
const DEFAULT_STREAM_HEIGHT: u32 = 480;
const DEFAULT_FPS: u32 = 30;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Deserialize, Default)]
struct DepthfuseConfigFile {
    detector: Option<DetectorConfigFile>,
    camera: Option<CameraConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    conf_threshold: Option<f32>,
    iou_threshold: Option<f32>,
    input_width: Option<u32>,
    input_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    color_width: Option<u32>,
    color_height: Option<u32>,
    depth_width: Option<u32>,
    depth_height: Option<u32>,
    fps: Option<u32>,
    acquire_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DepthfuseConfig {
    pub detector: DetectorSettings,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    /// Backend name: "stub" or "tract".
    pub backend: String,
    /// ONNX model path; required by the tract backend.
    pub model_path: Option<PathBuf>,
    pub labels_path: PathBuf,
    pub params: DetectionParams,
}

/// Decode/suppression parameters, passed explicitly into the core stages —
/// no global mutable state.
#[derive(Debug, Clone, Copy)]
pub struct DetectionParams {
    /// Minimum class score for a prediction to become a candidate (strictly
    /// greater survives).
    pub conf_threshold: f32,
    /// IoU above which an overlapping lower-confidence box is suppressed.
    pub iou_threshold: f32,
    /// Model input square.
    pub input_width: u32,
    pub input_height: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            conf_threshold: DEFAULT_CONF_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            input_width: DEFAULT_INPUT_WIDTH,
            input_height: DEFAULT_INPUT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub color_width: u32,
    pub color_height: u32,
    pub depth_width: u32,
    pub depth_height: u32,
    pub fps: u32,
    pub acquire_timeout: Duration,
}

impl CameraSettings {
    pub fn camera_config(&self) -> crate::ingest::CameraConfig {
        crate::ingest::CameraConfig {
            device: self.device.clone(),
            color_width: self.color_width,
            color_height: self.color_height,
            depth_width: self.depth_width,
            depth_height: self.depth_height,
            fps: self.fps,
        }
    }
}

impl DepthfuseConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DEPTHFUSE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DepthfuseConfigFile) -> Self {
        let detector = file.detector.unwrap_or_default();
        let camera = file.camera.unwrap_or_default();
        Self {
            detector: DetectorSettings {
                backend: detector
                    .backend
                    .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
                model_path: detector.model_path,
                labels_path: detector
                    .labels_path
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LABELS_PATH)),
                params: DetectionParams {
                    conf_threshold: detector.conf_threshold.unwrap_or(DEFAULT_CONF_THRESHOLD),
                    iou_threshold: detector.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
                    input_width: detector.input_width.unwrap_or(DEFAULT_INPUT_WIDTH),
                    input_height: detector.input_height.unwrap_or(DEFAULT_INPUT_HEIGHT),
                },
            },
            camera: CameraSettings {
                device: camera.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
                color_width: camera.color_width.unwrap_or(DEFAULT_STREAM_WIDTH),
                color_height: camera.color_height.unwrap_or(DEFAULT_STREAM_HEIGHT),
                depth_width: camera.depth_width.unwrap_or(DEFAULT_STREAM_WIDTH),
                depth_height: camera.depth_height.unwrap_or(DEFAULT_STREAM_HEIGHT),
                fps: camera.fps.unwrap_or(DEFAULT_FPS),
                acquire_timeout: Duration::from_millis(
                    camera
                        .acquire_timeout_ms
                        .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_MS),
                ),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(backend) = std::env::var("DEPTHFUSE_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend;
            }
        }
        if let Ok(path) = std::env::var("DEPTHFUSE_MODEL") {
            if !path.trim().is_empty() {
                self.detector.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("DEPTHFUSE_LABELS") {
            if !path.trim().is_empty() {
                self.detector.labels_path = PathBuf::from(path);
            }
        }
        if let Ok(device) = std::env::var("DEPTHFUSE_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(threshold) = std::env::var("DEPTHFUSE_CONF_THRESHOLD") {
            self.detector.params.conf_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("DEPTHFUSE_CONF_THRESHOLD must be a number"))?;
        }
        if let Ok(threshold) = std::env::var("DEPTHFUSE_IOU_THRESHOLD") {
            self.detector.params.iou_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("DEPTHFUSE_IOU_THRESHOLD must be a number"))?;
        }
        Ok(())
    }

    /// Re-check invariants; `load` runs this, and callers that override
    /// fields afterwards (CLI flags) run it again.
    pub fn validate(&self) -> Result<()> {
        let params = &self.detector.params;
        if !(0.0..1.0).contains(&params.conf_threshold) {
            return Err(anyhow!(
                "conf_threshold must be in [0, 1), got {}",
                params.conf_threshold
            ));
        }
        if !(0.0..=1.0).contains(&params.iou_threshold) {
            return Err(anyhow!(
                "iou_threshold must be in [0, 1], got {}",
                params.iou_threshold
            ));
        }
        if params.input_width == 0 || params.input_height == 0 {
            return Err(anyhow!("model input dimensions must be non-zero"));
        }
        match self.detector.backend.as_str() {
            "stub" => {}
            "tract" => {
                if self.detector.model_path.is_none() {
                    return Err(anyhow!("the tract backend requires a model path"));
                }
            }
            other => return Err(anyhow!("unknown detector backend '{}'", other)),
        }
        if self.camera.color_width == 0
            || self.camera.color_height == 0
            || self.camera.depth_width == 0
            || self.camera.depth_height == 0
        {
            return Err(anyhow!("camera stream dimensions must be non-zero"));
        }
        if self.camera.fps == 0 {
            return Err(anyhow!("camera fps must be greater than zero"));
        }
        if self.camera.acquire_timeout.is_zero() {
            return Err(anyhow!("acquire timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<DepthfuseConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
