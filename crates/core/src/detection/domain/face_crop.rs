use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// One face as reported by a detector, before embedding.
///
/// `ordinal` is the face's position within its frame's detection list,
/// so `(frame_index, ordinal)` identifies a detection within a batch.
#[derive(Clone, Debug)]
pub struct FaceCrop {
    pub frame_index: usize,
    pub ordinal: usize,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
    pub crop: Frame,
}
