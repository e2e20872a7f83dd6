use std::sync::Arc;

use crate::grouping::domain::face_verifier::{FaceVerifier, VerificationError};

/// Decorator that asks the inner verifier both ways round.
///
/// Comparison only evaluates `verify(a, b)` for `a` before `b`, which is
/// sound only if the verifier is symmetric. This wrapper checks that
/// assumption on every pair: disagreement is logged and the pair is
/// treated as not verified.
pub struct SymmetricVerifier {
    inner: Arc<dyn FaceVerifier>,
}

impl SymmetricVerifier {
    pub fn new(inner: Arc<dyn FaceVerifier>) -> Self {
        Self { inner }
    }
}

impl FaceVerifier for SymmetricVerifier {
    fn verify(&self, a: &[f32], b: &[f32]) -> Result<bool, VerificationError> {
        let forward = self.inner.verify(a, b)?;
        let backward = self.inner.verify(b, a)?;
        if forward != backward {
            log::warn!(
                "Verifier is asymmetric: verify(a, b) = {forward}, verify(b, a) = {backward}"
            );
        }
        Ok(forward && backward)
    }
}
