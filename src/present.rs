//! Presenter boundary.
//!
//! Rendering is an external collaborator: the core hands each cycle's color
//! frame, observations, and depth preview to a [`Presenter`] and relies on
//! nothing coming back. The crate ships a stdout presenter for headless runs;
//! window display and colormapping live outside.

use anyhow::Result;

use crate::frame::{ColorFrame, DepthFrame};
use crate::fuse::Observation;
use crate::labels::ClassLabels;

/// Scale factor mapping raw depth samples into the 8-bit preview range.
pub const DEPTH_PREVIEW_ALPHA: f32 = 0.03;

/// 8-bit depth visualization buffer, ready for colormapping by a display
/// layer.
pub struct DepthPreview {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl DepthPreview {
    /// Scale raw samples by `alpha`, rounding and saturating at 255.
    pub fn from_depth(depth: &DepthFrame, alpha: f32) -> Self {
        let pixels = depth
            .samples()
            .iter()
            .map(|&sample| (sample as f32 * alpha).round().clamp(0.0, 255.0) as u8)
            .collect();
        Self {
            pixels,
            width: depth.width,
            height: depth.height,
        }
    }
}

/// Per-cycle rendering sink.
///
/// Pure side effect; the core does not rely on the return value beyond
/// logging failures and moving on.
pub trait Presenter {
    fn render(
        &mut self,
        color: &ColorFrame,
        observations: &[Observation],
        depth_preview: Option<&DepthPreview>,
    ) -> Result<()>;
}

/// Logs one line per observation to stdout. Distance is omitted, not zeroed,
/// when the cycle carried no depth.
pub struct StdoutPresenter {
    labels: ClassLabels,
}

impl StdoutPresenter {
    pub fn new(labels: ClassLabels) -> Self {
        Self { labels }
    }
}

impl Presenter for StdoutPresenter {
    fn render(
        &mut self,
        _color: &ColorFrame,
        observations: &[Observation],
        _depth_preview: Option<&DepthPreview>,
    ) -> Result<()> {
        for obs in observations {
            println!("{}", format_observation(&self.labels, obs));
        }
        Ok(())
    }
}

fn format_observation(labels: &ClassLabels, obs: &Observation) -> String {
    let label = labels.get(obs.class_id).unwrap_or("?");
    let mut line = format!(
        "{}: {:.2} box=({},{} {}x{}) anchor=({},{})",
        label,
        obs.confidence,
        obs.rect.left,
        obs.rect.top,
        obs.rect.width,
        obs.rect.height,
        obs.anchor_x,
        obs.anchor_y
    );
    if let Some(distance) = obs.distance_m {
        line.push_str(&format!(" Dist: {:.2} meter away", distance));
    }
    line
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::PixelRect;

    fn observation(distance_m: Option<f32>) -> Observation {
        Observation {
            class_id: 0,
            confidence: 0.9,
            rect: PixelRect {
                left: 256,
                top: 192,
                width: 128,
                height: 96,
            },
            anchor_x: 320,
            anchor_y: 240,
            distance_m,
        }
    }

    #[test]
    fn preview_scales_and_saturates() {
        let depth = DepthFrame::new(vec![0, 1000, 60000], 3, 1).unwrap();
        let preview = DepthPreview::from_depth(&depth, DEPTH_PREVIEW_ALPHA);
        assert_eq!(preview.pixels, vec![0, 30, 255]);
        assert_eq!(preview.width, 3);
        assert_eq!(preview.height, 1);
    }

    #[test]
    fn distance_line_includes_meters_when_present() {
        let labels = ClassLabels::parse("person").unwrap();
        let line = format_observation(&labels, &observation(Some(1.0)));
        assert!(line.starts_with("person: 0.90"));
        assert!(line.contains("Dist: 1.00 meter away"));
    }

    #[test]
    fn distance_is_omitted_when_absent() {
        let labels = ClassLabels::parse("person").unwrap();
        let line = format_observation(&labels, &observation(None));
        assert!(!line.contains("Dist:"));
    }
}
