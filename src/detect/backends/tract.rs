#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawPrediction;
use crate::frame::ColorFrame;

/// Tract-based backend for ONNX detection models.
///
/// Loads a local model file once at startup and runs the forward pass on RGB
/// frames. Frames are resampled (nearest neighbor) to the model's input
/// square and normalized to [0, 1]; output tensors are flattened into
/// per-cell prediction rows with class scores starting at offset 5.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    input_width: u32,
    input_height: u32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    ///
    /// Missing or corrupt model files fail here, before any loop runs.
    pub fn load<P: AsRef<Path>>(model_path: P, input_width: u32, input_height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width,
            input_height,
        })
    }

    /// Build the [1, 3, H, W] input tensor: nearest-neighbor resample to the
    /// model square, scale by 1/255, channel-planar layout.
    fn build_input(&self, frame: &ColorFrame) -> Tensor {
        let (in_w, in_h) = (self.input_width as usize, self.input_height as usize);
        let (src_w, src_h) = (frame.width as usize, frame.height as usize);
        let pixels = frame.pixels();

        let input = tract_ndarray::Array4::from_shape_fn((1, 3, in_h, in_w), |(_, c, y, x)| {
            let src_x = x * src_w / in_w;
            let src_y = y * src_h / in_h;
            let idx = (src_y * src_w + src_x) * 3 + c;
            pixels[idx] as f32 / 255.0
        });

        input.into_tensor()
    }

    /// Flatten one output tensor into prediction rows.
    ///
    /// The last dimension is the per-cell attribute count (box, objectness,
    /// class scores); anything shorter than the box+objectness prefix means
    /// the model does not match this decoder's layout.
    fn collect_rows(tensor: &Tensor, rows: &mut Vec<RawPrediction>) -> Result<()> {
        let view = tensor
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let row_len = *view
            .shape()
            .last()
            .ok_or_else(|| anyhow!("model output tensor has no dimensions"))?;
        if row_len < 5 {
            return Err(anyhow!(
                "model output rows carry {} values; expected at least 5 (box + objectness)",
                row_len
            ));
        }

        let flat: Vec<f32> = view.iter().copied().collect();
        for chunk in flat.chunks_exact(row_len) {
            if let Some(pred) = RawPrediction::from_row(chunk) {
                rows.push(pred);
            }
        }
        Ok(())
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn infer(&mut self, frame: &ColorFrame) -> Result<Vec<RawPrediction>> {
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;

        let mut rows = Vec::new();
        for output in outputs.iter() {
            Self::collect_rows(output, &mut rows)?;
        }
        Ok(rows)
    }
}
