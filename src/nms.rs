//! Non-maximum suppression.
//!
//! Greedy NMS over all candidate boxes in one pass, across classes — boxes
//! reach suppression undifferentiated, so a high-confidence box of one class
//! can suppress an overlapping box of another. That cross-class behavior is
//! intentional and load-bearing for output compatibility.

use std::cmp::Ordering;

use crate::decode::{CandidateBox, PixelRect};

/// Intersection-over-union of two axis-aligned pixel rectangles.
///
/// 0.0 when the rectangles are disjoint or their union is empty.
pub fn iou(a: &PixelRect, b: &PixelRect) -> f32 {
    let inter_left = a.left.max(b.left);
    let inter_top = a.top.max(b.top);
    let inter_right = (a.left + a.width).min(b.left + b.width);
    let inter_bottom = (a.top + a.height).min(b.top + b.height);

    if inter_right <= inter_left || inter_bottom <= inter_top {
        return 0.0;
    }

    let intersection = (inter_right - inter_left) as f32 * (inter_bottom - inter_top) as f32;
    let union =
        a.width as f32 * a.height as f32 + b.width as f32 * b.height as f32 - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Greedy NMS. Returns indices into `candidates` for the surviving boxes,
/// ordered by descending confidence.
///
/// Boxes with confidence at or below `score_threshold` are discarded first.
/// Equal-confidence ordering is stable: the earlier input index wins. The
/// output is deterministic for identical input, never larger than the input,
/// and never alters a surviving box — it only selects. Empty input yields an
/// empty output.
pub fn suppress(candidates: &[CandidateBox], score_threshold: f32, iou_threshold: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len())
        .filter(|&i| candidates[i].confidence > score_threshold)
        .collect();

    // Stable sort: equal confidence keeps ascending input order.
    order.sort_by(|&a, &b| {
        candidates[b]
            .confidence
            .partial_cmp(&candidates[a].confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut suppressed = vec![false; candidates.len()];
    let mut keep = Vec::new();

    for pos in 0..order.len() {
        let i = order[pos];
        if suppressed[i] {
            continue;
        }
        keep.push(i);
        for &j in &order[pos + 1..] {
            if !suppressed[j] && iou(&candidates[i].rect, &candidates[j].rect) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(class_id: usize, confidence: f32, rect: PixelRect) -> CandidateBox {
        CandidateBox {
            class_id,
            confidence,
            rect,
        }
    }

    fn rect(left: i32, top: i32, width: i32, height: i32) -> PixelRect {
        PixelRect {
            left,
            top,
            width,
            height,
        }
    }

    #[test]
    fn iou_of_identical_rects_is_one() {
        let r = rect(10, 10, 100, 50);
        assert_eq!(iou(&r, &r), 1.0);
    }

    #[test]
    fn iou_of_disjoint_rects_is_zero() {
        assert_eq!(iou(&rect(0, 0, 10, 10), &rect(20, 20, 10, 10)), 0.0);
        // Touching edges do not overlap.
        assert_eq!(iou(&rect(0, 0, 10, 10), &rect(10, 0, 10, 10)), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        // 10x10 boxes offset by half: intersection 50, union 150.
        let a = rect(0, 0, 10, 10);
        let b = rect(5, 0, 10, 10);
        let v = iou(&a, &b);
        assert!((v - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn higher_confidence_box_suppresses_overlap() {
        // Heavy overlap (IoU well above 0.4): only the 0.9 box survives.
        let candidates = vec![
            candidate(0, 0.6, rect(2, 0, 100, 100)),
            candidate(0, 0.9, rect(0, 0, 100, 100)),
        ];
        let kept = suppress(&candidates, 0.5, 0.4);
        assert_eq!(kept, vec![1]);
    }

    #[test]
    fn disjoint_boxes_all_survive() {
        let candidates = vec![
            candidate(0, 0.9, rect(0, 0, 50, 50)),
            candidate(1, 0.8, rect(200, 200, 50, 50)),
        ];
        let kept = suppress(&candidates, 0.5, 0.4);
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn suppression_runs_across_classes() {
        // Same geometry, different classes: the lower-confidence class loses.
        let candidates = vec![
            candidate(2, 0.9, rect(0, 0, 100, 100)),
            candidate(7, 0.8, rect(0, 0, 100, 100)),
        ];
        let kept = suppress(&candidates, 0.5, 0.4);
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn equal_confidence_keeps_earlier_index() {
        let candidates = vec![
            candidate(0, 0.9, rect(0, 0, 100, 100)),
            candidate(0, 0.9, rect(0, 0, 100, 100)),
        ];
        let kept = suppress(&candidates, 0.5, 0.4);
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn suppression_is_idempotent() {
        let candidates = vec![
            candidate(0, 0.9, rect(0, 0, 100, 100)),
            candidate(0, 0.6, rect(5, 5, 100, 100)),
            candidate(1, 0.8, rect(300, 300, 40, 40)),
        ];
        let first = suppress(&candidates, 0.5, 0.4);
        let survivors: Vec<CandidateBox> =
            first.iter().map(|&i| candidates[i].clone()).collect();
        let second = suppress(&survivors, 0.5, 0.4);
        // Running again on the surviving subset keeps everything.
        assert_eq!(second.len(), first.len());
        assert_eq!(suppress(&candidates, 0.5, 0.4), first);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(suppress(&[], 0.5, 0.4).is_empty());
    }

    #[test]
    fn single_candidate_always_survives() {
        let candidates = vec![candidate(0, 0.51, rect(0, 0, 10, 10))];
        assert_eq!(suppress(&candidates, 0.5, 0.4), vec![0]);
    }

    #[test]
    fn score_threshold_is_honored_independently() {
        // Decoder normally filters already; suppress must still honor its own
        // threshold when handed lower-confidence boxes.
        let candidates = vec![
            candidate(0, 0.3, rect(0, 0, 10, 10)),
            candidate(0, 0.9, rect(100, 0, 10, 10)),
        ];
        assert_eq!(suppress(&candidates, 0.5, 0.4), vec![1]);
    }
}
