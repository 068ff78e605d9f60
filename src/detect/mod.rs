mod backend;
mod backends;
mod result;

use anyhow::Result;

use crate::config::DetectorSettings;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use result::RawPrediction;

/// Build the configured detector backend.
///
/// Model loading happens here, at startup; missing or corrupt model files
/// are fatal before any loop runs.
pub fn build_backend(settings: &DetectorSettings) -> Result<Box<dyn DetectorBackend>> {
    match settings.backend.as_str() {
        "stub" => Ok(Box::new(StubBackend::new())),
        "tract" => {
            #[cfg(feature = "backend-tract")]
            {
                let model_path = settings.model_path.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("the tract backend requires a model path")
                })?;
                Ok(Box::new(TractBackend::load(
                    model_path,
                    settings.params.input_width,
                    settings.params.input_height,
                )?))
            }
            #[cfg(not(feature = "backend-tract"))]
            {
                anyhow::bail!("backend 'tract' requires the backend-tract feature")
            }
        }
        other => Err(anyhow::anyhow!("unknown detector backend '{}'", other)),
    }
}
