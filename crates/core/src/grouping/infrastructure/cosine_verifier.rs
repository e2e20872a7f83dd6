use crate::grouping::domain::face_verifier::{FaceVerifier, VerificationError};
use crate::shared::math::cosine_distance;

/// Certifies two ArcFace embeddings as one person when their cosine
/// distance is at or below `threshold`.
pub struct CosineVerifier {
    threshold: f64,
}

impl CosineVerifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl FaceVerifier for CosineVerifier {
    fn verify(&self, a: &[f32], b: &[f32]) -> Result<bool, VerificationError> {
        let distance = cosine_distance(a, b).ok_or_else(|| {
            VerificationError::Incomparable(format!(
                "lengths {} and {} or zero norm",
                a.len(),
                b.len()
            ))
        })?;
        Ok(distance <= self.threshold)
    }
}
