use thiserror::Error;

use crate::detection::domain::face_crop::FaceCrop;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// The detector ran and found nothing. Not a fault.
    #[error("no face found in frame {frame_index}")]
    NoFace { frame_index: usize },
    #[error("detector failed: {0}")]
    Backend(String),
}

impl DetectionError {
    pub fn is_no_evidence(&self) -> bool {
        matches!(self, DetectionError::NoFace { .. })
    }
}

/// Domain interface for locating faces in a frame.
///
/// Called concurrently from extraction workers, hence `&self` + `Sync`.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceCrop>, DetectionError>;
}
