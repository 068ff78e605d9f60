/// One raw per-cell prediction row from a detector backend.
///
/// Mirrors the flat YOLO output vector: four normalized box coordinates, an
/// objectness slot, then the per-class score sub-vector. Scores are
/// non-negative but not necessarily normalized. Rows live only until the
/// decoder has consumed them.
#[derive(Clone, Debug)]
pub struct RawPrediction {
    /// Normalized [center_x, center_y, width, height], each in [0, 1].
    pub bbox: [f32; 4],
    /// Objectness score. Not consulted by the decoder; kept because backends
    /// produce it and the row layout starts class scores after it.
    pub objectness: f32,
    /// Per-class scores, 0-based, indexing the class label table.
    pub class_scores: Vec<f32>,
}

impl RawPrediction {
    /// Build a row from a flat output vector [cx, cy, w, h, obj, scores...].
    ///
    /// Returns `None` when the vector is too short to carry the box and
    /// objectness slots.
    pub fn from_row(row: &[f32]) -> Option<Self> {
        if row.len() < 5 {
            return None;
        }
        Some(Self {
            bbox: [row[0], row[1], row[2], row[3]],
            objectness: row[4],
            class_scores: row[5..].to_vec(),
        })
    }
}
