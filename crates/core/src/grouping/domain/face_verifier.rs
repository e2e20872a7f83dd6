use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerificationError {
    /// The embeddings cannot be compared (shape mismatch, zero vector).
    #[error("embeddings are incomparable: {0}")]
    Incomparable(String),
    #[error("verifier failed: {0}")]
    Backend(String),
}

impl VerificationError {
    pub fn is_no_evidence(&self) -> bool {
        matches!(self, VerificationError::Incomparable(_))
    }
}

/// Domain interface deciding whether two embeddings depict one person.
///
/// Only index-ordered pairs are ever asked, so implementations are
/// expected to be symmetric.
pub trait FaceVerifier: Send + Sync {
    fn verify(&self, a: &[f32], b: &[f32]) -> Result<bool, VerificationError>;
}
