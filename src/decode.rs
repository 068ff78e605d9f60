//! Detection-score decoding.
//!
//! Converts raw per-cell prediction rows into thresholded candidate boxes in
//! pixel space. The conversion truncates floating-point intermediates toward
//! zero; later stages key on those exact pixel coordinates, so the cast must
//! stay a truncation, not a rounding.

use serde::Serialize;

use crate::detect::RawPrediction;

/// Axis-aligned pixel rectangle, top-left anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// A candidate detection that survived the confidence threshold.
///
/// `confidence` is the maximum class score of the originating prediction and
/// is always strictly above the threshold; `class_id` is the argmax over the
/// class-score sub-vector. Candidates live only within one frame's
/// processing.
#[derive(Clone, Debug)]
pub struct CandidateBox {
    pub class_id: usize,
    pub confidence: f32,
    pub rect: PixelRect,
}

/// Decode prediction rows into candidate boxes.
///
/// Pure function: drops every row whose best class score is not strictly
/// above `conf_threshold` (rows with no class scores can never pass), and
/// never fails. Ties on the best score resolve to the lowest class index.
pub fn decode(
    predictions: &[RawPrediction],
    frame_width: u32,
    frame_height: u32,
    conf_threshold: f32,
) -> Vec<CandidateBox> {
    let mut candidates = Vec::new();

    for pred in predictions {
        let Some((class_id, confidence)) = best_class(&pred.class_scores) else {
            continue;
        };
        if confidence <= conf_threshold {
            continue;
        }

        let center_x = (pred.bbox[0] * frame_width as f32) as i32;
        let center_y = (pred.bbox[1] * frame_height as f32) as i32;
        let width = (pred.bbox[2] * frame_width as f32) as i32;
        let height = (pred.bbox[3] * frame_height as f32) as i32;
        let left = (center_x as f32 - width as f32 / 2.0) as i32;
        let top = (center_y as f32 - height as f32 / 2.0) as i32;

        candidates.push(CandidateBox {
            class_id,
            confidence,
            rect: PixelRect {
                left,
                top,
                width,
                height,
            },
        });
    }

    candidates
}

/// Argmax over the class scores; first index wins on ties.
fn best_class(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(bbox: [f32; 4], class_scores: Vec<f32>) -> RawPrediction {
        RawPrediction {
            bbox,
            objectness: 1.0,
            class_scores,
        }
    }

    #[test]
    fn decodes_center_box_with_truncation() {
        // Normalized [0.5, 0.5, 0.2, 0.2] on 640x480, class 3 at 0.9.
        let preds = vec![pred([0.5, 0.5, 0.2, 0.2], vec![0.0, 0.0, 0.0, 0.9])];
        let out = decode(&preds, 640, 480, 0.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class_id, 3);
        assert_eq!(out[0].confidence, 0.9);
        assert_eq!(
            out[0].rect,
            PixelRect {
                left: 256,
                top: 192,
                width: 128,
                height: 96,
            }
        );
    }

    #[test]
    fn drops_scores_at_or_below_threshold() {
        let preds = vec![
            pred([0.5, 0.5, 0.2, 0.2], vec![0.5]),
            pred([0.5, 0.5, 0.2, 0.2], vec![0.51]),
        ];
        let out = decode(&preds, 640, 480, 0.5);
        // The 0.5 score equals the threshold and is dropped; only strictly
        // greater survives.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 0.51);
    }

    #[test]
    fn argmax_ties_resolve_to_lowest_index() {
        let preds = vec![pred([0.5, 0.5, 0.2, 0.2], vec![0.3, 0.9, 0.9])];
        let out = decode(&preds, 640, 480, 0.5);
        assert_eq!(out[0].class_id, 1);
    }

    #[test]
    fn empty_score_vector_never_passes() {
        let preds = vec![pred([0.5, 0.5, 0.2, 0.2], vec![])];
        assert!(decode(&preds, 640, 480, 0.5).is_empty());
    }

    #[test]
    fn negative_left_truncates_toward_zero() {
        // center_x = (0.01 * 640) as i32 = 6, width = (0.33 * 640) as i32 = 211,
        // left = (6 - 105.5) as i32 = -99 (truncation, where floor gives -100).
        let preds = vec![pred([0.01, 0.5, 0.33, 0.2], vec![0.9])];
        let out = decode(&preds, 640, 480, 0.5);
        assert_eq!(out[0].rect.left, -99);
        assert_eq!(out[0].rect.width, 211);
    }

    #[test]
    fn confidence_is_maximum_class_score() {
        let preds = vec![pred([0.5, 0.5, 0.2, 0.2], vec![0.6, 0.8, 0.7])];
        let out = decode(&preds, 640, 480, 0.5);
        assert_eq!(out[0].confidence, 0.8);
        assert_eq!(out[0].class_id, 1);
    }
}
