use thiserror::Error;

use crate::detection::domain::detected_face::DetectedFace;
use crate::matching::domain::identity::IdentityCandidate;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// The matcher had nothing to say about this face.
    #[error("matcher returned no result")]
    NoResult,
    #[error("degenerate face input: {0}")]
    Degenerate(String),
    #[error("matcher failed: {0}")]
    Backend(String),
}

impl MatchError {
    pub fn is_no_evidence(&self) -> bool {
        matches!(self, MatchError::NoResult | MatchError::Degenerate(_))
    }
}

/// Domain interface querying the reference store for one face.
///
/// An empty list is a valid answer. Calls are independent and read-only.
pub trait IdentityMatcher: Send + Sync {
    fn match_face(&self, face: &DetectedFace) -> Result<Vec<IdentityCandidate>, MatchError>;
}
