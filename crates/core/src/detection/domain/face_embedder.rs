use thiserror::Error;

use crate::detection::domain::face_crop::FaceCrop;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("embedding failed for face {ordinal} of frame {frame_index}: {reason}")]
    Backend {
        frame_index: usize,
        ordinal: usize,
        reason: String,
    },
}

/// Domain interface for turning a face crop into a fixed-length vector.
pub trait FaceEmbedder: Send + Sync {
    fn embed(&self, face: &FaceCrop) -> Result<Vec<f32>, EmbeddingError>;
}
