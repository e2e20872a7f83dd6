use std::sync::Arc;

use crate::detection::domain::detected_face::DetectedFace;
use crate::matching::domain::identity::IdentityCandidate;
use crate::matching::domain::identity_matcher::{IdentityMatcher, MatchError};
use crate::matching::domain::reference_gallery::ReferenceGallery;
use crate::shared::math::cosine_distance;

/// Brute-force cosine search over every reference embedding.
///
/// Returns one candidate per reference within `threshold`, closest first,
/// so an identity with several reference photos can contribute several
/// distances for a single face.
pub struct GalleryMatcher {
    gallery: Arc<ReferenceGallery>,
    threshold: f64,
}

impl GalleryMatcher {
    pub fn new(gallery: Arc<ReferenceGallery>, threshold: f64) -> Self {
        Self { gallery, threshold }
    }
}

impl IdentityMatcher for GalleryMatcher {
    fn match_face(&self, face: &DetectedFace) -> Result<Vec<IdentityCandidate>, MatchError> {
        if face.embedding.is_empty() {
            return Err(MatchError::Degenerate(format!(
                "empty embedding for face in frame {}",
                face.frame_index
            )));
        }
        if self.gallery.is_empty() {
            return Err(MatchError::NoResult);
        }

        let mut candidates: Vec<IdentityCandidate> = self
            .gallery
            .references()
            .iter()
            .filter_map(|reference| {
                let distance = cosine_distance(&face.embedding, &reference.embedding)?;
                (distance <= self.threshold)
                    .then(|| IdentityCandidate::new(reference.identity_id, distance))
            })
            .collect();
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(candidates)
    }
}
