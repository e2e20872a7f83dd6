use crate::shared::bounding_box::BoundingBox;

/// An accepted, embedded face. Immutable once built by extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub frame_index: usize,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
    pub embedding: Vec<f32>,
}
