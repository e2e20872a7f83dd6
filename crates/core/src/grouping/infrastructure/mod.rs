pub mod cosine_verifier;
pub mod symmetric_verifier;
