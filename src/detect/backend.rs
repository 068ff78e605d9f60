use anyhow::Result;

use crate::detect::result::RawPrediction;
use crate::frame::ColorFrame;

/// Detector backend trait.
///
/// The network is an opaque capability: any backend that maps a color frame
/// to per-cell raw predictions is interchangeable. Backends own their model
/// state; the pipeline never inspects it.
///
/// Backends must not retain the frame beyond the `infer` call. A backend that
/// cannot interpret its own model output (wrong tensor shape, non-float data)
/// must fail the cycle with an error rather than return misdecoded rows.
pub trait DetectorBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run the forward pass and flatten the output tensors into per-cell rows.
    fn infer(&mut self, frame: &ColorFrame) -> Result<Vec<RawPrediction>>;
}

impl<D: DetectorBackend + ?Sized> DetectorBackend for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn infer(&mut self, frame: &ColorFrame) -> Result<Vec<RawPrediction>> {
        (**self).infer(frame)
    }
}
