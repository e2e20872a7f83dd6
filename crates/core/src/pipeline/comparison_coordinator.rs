//! Parallel pairwise verification phase.
//!
//! Work is split per source index: the task for `i` verifies `i` against
//! every `j > i`, so each unordered pair is asked once and no face is
//! ever compared with itself.

use crate::detection::domain::detected_face::DetectedFace;
use crate::grouping::domain::face_verifier::FaceVerifier;
use crate::grouping::domain::match_edge::MatchEdge;
use crate::pipeline::infrastructure::bounded_worker_pool::{BoundedWorkerPool, WorkerPoolError};

/// Verified edges plus pair statistics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub edges: Vec<MatchEdge>,
    pub pairs_evaluated: usize,
    pub incomparable_pairs: usize,
    pub verifier_failures: usize,
}

#[derive(Default)]
struct RowComparison {
    edges: Vec<MatchEdge>,
    pairs: usize,
    incomparable: usize,
    failures: usize,
}

pub struct ComparisonCoordinator<'a> {
    verifier: &'a dyn FaceVerifier,
    pool: &'a BoundedWorkerPool,
}

impl<'a> ComparisonCoordinator<'a> {
    pub fn new(verifier: &'a dyn FaceVerifier, pool: &'a BoundedWorkerPool) -> Self {
        Self { verifier, pool }
    }

    /// Verifies every unordered pair of `faces` and blocks until all rows
    /// are done. Failed verifications count as "not the same person".
    pub fn compare(&self, faces: &[DetectedFace]) -> Result<ComparisonOutcome, WorkerPoolError> {
        let rows: Vec<usize> = (0..faces.len().saturating_sub(1)).collect();
        let per_row = self.pool.map(rows, |i| self.compare_row(faces, i))?;

        let mut outcome = ComparisonOutcome::default();
        for row in per_row {
            outcome.pairs_evaluated += row.pairs;
            outcome.incomparable_pairs += row.incomparable;
            outcome.verifier_failures += row.failures;
            outcome.edges.extend(row.edges);
        }
        Ok(outcome)
    }

    fn compare_row(&self, faces: &[DetectedFace], i: usize) -> RowComparison {
        let mut row = RowComparison::default();
        let source = &faces[i].embedding;

        for (j, target) in faces.iter().enumerate().skip(i + 1) {
            row.pairs += 1;
            match self.verifier.verify(source, &target.embedding) {
                Ok(true) => row.edges.extend(MatchEdge::new(i, j)),
                Ok(false) => {}
                Err(e) if e.is_no_evidence() => {
                    log::debug!("Faces {i} and {j}: {e}");
                    row.incomparable += 1;
                }
                Err(e) => {
                    log::warn!("Faces {i} and {j}: {e}");
                    row.failures += 1;
                }
            }
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::domain::face_verifier::VerificationError;
    use crate::shared::bounding_box::BoundingBox;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Face whose embedding carries its own index in slot 0.
    fn face(index: usize) -> DetectedFace {
        DetectedFace {
            frame_index: index,
            confidence: 1.0,
            bounding_box: BoundingBox::new(0, 0, 10, 10),
            embedding: vec![index as f32, 1.0],
        }
    }

    fn faces(count: usize) -> Vec<DetectedFace> {
        (0..count).map(face).collect()
    }

    enum Answer {
        Always(bool),
        Incomparable,
        Fail,
    }

    struct RecordingVerifier {
        answer: Answer,
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl RecordingVerifier {
        fn new(answer: Answer) -> Self {
            Self {
                answer,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(usize, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl FaceVerifier for RecordingVerifier {
        fn verify(&self, a: &[f32], b: &[f32]) -> Result<bool, VerificationError> {
            self.calls
                .lock()
                .unwrap()
                .push((a[0] as usize, b[0] as usize));
            match self.answer {
                Answer::Always(v) => Ok(v),
                Answer::Incomparable => Err(VerificationError::Incomparable("zero".into())),
                Answer::Fail => Err(VerificationError::Backend("offline".into())),
            }
        }
    }

    #[test]
    fn test_every_pair_verified_at_most_once_and_never_with_itself() {
        let verifier = RecordingVerifier::new(Answer::Always(false));
        let pool = BoundedWorkerPool::new(3);
        let coordinator = ComparisonCoordinator::new(&verifier, &pool);

        let outcome = coordinator.compare(&faces(6)).unwrap();

        let calls = verifier.calls();
        let unique: HashSet<(usize, usize)> = calls
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        assert_eq!(calls.len(), 15);
        assert_eq!(unique.len(), 15);
        assert!(calls.iter().all(|&(a, b)| a < b));
        assert_eq!(outcome.pairs_evaluated, 15);
    }

    #[test]
    fn test_all_true_yields_complete_edge_set() {
        let verifier = RecordingVerifier::new(Answer::Always(true));
        let pool = BoundedWorkerPool::new(2);
        let coordinator = ComparisonCoordinator::new(&verifier, &pool);

        let outcome = coordinator.compare(&faces(4)).unwrap();

        assert_eq!(outcome.edges.len(), 6);
        assert!(outcome.edges.iter().all(|e| e.i < e.j));
    }

    #[test]
    fn test_all_false_yields_no_edges() {
        let verifier = RecordingVerifier::new(Answer::Always(false));
        let pool = BoundedWorkerPool::new(2);
        let coordinator = ComparisonCoordinator::new(&verifier, &pool);

        let outcome = coordinator.compare(&faces(4)).unwrap();

        assert!(outcome.edges.is_empty());
    }

    #[test]
    fn test_failures_are_absorbed_as_missing_edges() {
        let pool = BoundedWorkerPool::new(2);

        let incomparable = RecordingVerifier::new(Answer::Incomparable);
        let outcome = ComparisonCoordinator::new(&incomparable, &pool)
            .compare(&faces(3))
            .unwrap();
        assert!(outcome.edges.is_empty());
        assert_eq!(outcome.incomparable_pairs, 3);
        assert_eq!(outcome.verifier_failures, 0);

        let failing = RecordingVerifier::new(Answer::Fail);
        let outcome = ComparisonCoordinator::new(&failing, &pool)
            .compare(&faces(3))
            .unwrap();
        assert!(outcome.edges.is_empty());
        assert_eq!(outcome.verifier_failures, 3);
    }

    #[test]
    fn test_fewer_than_two_faces_never_calls_verifier() {
        let verifier = RecordingVerifier::new(Answer::Always(true));
        let pool = BoundedWorkerPool::new(2);
        let coordinator = ComparisonCoordinator::new(&verifier, &pool);

        assert!(coordinator.compare(&faces(1)).unwrap().edges.is_empty());
        assert!(coordinator.compare(&[]).unwrap().edges.is_empty());
        assert!(verifier.calls().is_empty());
    }
}
