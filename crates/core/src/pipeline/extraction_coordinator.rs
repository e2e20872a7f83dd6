//! Parallel frame → face extraction phase.
//!
//! Each frame is handed to the detector exactly once and every accepted
//! crop is embedded exactly once. Per-frame results are merged in frame
//! order after the pool barrier, so face indices are stable across runs
//! regardless of worker scheduling.

use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::pipeline::infrastructure::bounded_worker_pool::{BoundedWorkerPool, WorkerPoolError};
use crate::shared::frame::Frame;

/// Faces extracted from a batch plus per-frame failure statistics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub faces: Vec<DetectedFace>,
    pub frames_processed: usize,
    pub frames_without_faces: usize,
    pub detection_failures: usize,
    pub rejected_low_confidence: usize,
    pub embedding_failures: usize,
}

#[derive(Default)]
struct FrameExtraction {
    faces: Vec<DetectedFace>,
    no_face: bool,
    detection_failed: bool,
    rejected: usize,
    embedding_failures: usize,
}

/// A crop is kept when its confidence is at least `min_confidence`.
/// A score exactly on the threshold passes; anything below it, or NaN,
/// is dropped before embedding.
pub struct ExtractionCoordinator<'a> {
    detector: &'a dyn FaceDetector,
    embedder: &'a dyn FaceEmbedder,
    min_confidence: f64,
    pool: &'a BoundedWorkerPool,
}

impl<'a> ExtractionCoordinator<'a> {
    pub fn new(
        detector: &'a dyn FaceDetector,
        embedder: &'a dyn FaceEmbedder,
        min_confidence: f64,
        pool: &'a BoundedWorkerPool,
    ) -> Self {
        Self {
            detector,
            embedder,
            min_confidence,
            pool,
        }
    }

    /// Runs detection and embedding over every frame and blocks until all
    /// workers are done.
    pub fn extract(&self, frames: &[Frame]) -> Result<ExtractionOutcome, WorkerPoolError> {
        let per_frame = self.pool.map(frames.iter().collect::<Vec<_>>(), |frame| {
            self.extract_frame(frame)
        })?;

        let mut outcome = ExtractionOutcome {
            frames_processed: frames.len(),
            ..Default::default()
        };
        for extraction in per_frame {
            if extraction.no_face {
                outcome.frames_without_faces += 1;
            }
            if extraction.detection_failed {
                outcome.detection_failures += 1;
            }
            outcome.rejected_low_confidence += extraction.rejected;
            outcome.embedding_failures += extraction.embedding_failures;
            outcome.faces.extend(extraction.faces);
        }
        Ok(outcome)
    }

    fn extract_frame(&self, frame: &Frame) -> FrameExtraction {
        let mut extraction = FrameExtraction::default();

        let crops = match self.detector.detect(frame) {
            Ok(crops) => crops,
            Err(e) if e.is_no_evidence() => {
                log::debug!("Frame {}: {e}", frame.index());
                extraction.no_face = true;
                return extraction;
            }
            Err(e) => {
                log::warn!("Frame {}: {e}", frame.index());
                extraction.detection_failed = true;
                return extraction;
            }
        };

        for crop in crops {
            if crop.confidence.is_nan() || crop.confidence < self.min_confidence {
                log::debug!(
                    "Frame {}: dropping face {} with confidence {:.4}",
                    crop.frame_index,
                    crop.ordinal,
                    crop.confidence
                );
                extraction.rejected += 1;
                continue;
            }
            match self.embedder.embed(&crop) {
                Ok(embedding) => extraction.faces.push(DetectedFace {
                    frame_index: crop.frame_index,
                    confidence: crop.confidence,
                    bounding_box: crop.bounding_box,
                    embedding,
                }),
                Err(e) => {
                    log::warn!("{e}");
                    extraction.embedding_failures += 1;
                }
            }
        }
        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_crop::FaceCrop;
    use crate::detection::domain::face_detector::DetectionError;
    use crate::detection::domain::face_embedder::EmbeddingError;
    use crate::shared::bounding_box::BoundingBox;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0; 4 * 4 * 3], 4, 4, 3, index)
    }

    fn crop(frame_index: usize, ordinal: usize, confidence: f64) -> FaceCrop {
        FaceCrop {
            frame_index,
            ordinal,
            confidence,
            bounding_box: BoundingBox::new(0, 0, 2, 2),
            crop: Frame::new(vec![0; 2 * 2 * 3], 2, 2, 3, frame_index),
        }
    }

    /// Scripted detector keyed by frame index; records every call.
    struct StubDetector {
        script: HashMap<usize, Result<Vec<FaceCrop>, DetectionError>>,
        calls: Mutex<Vec<usize>>,
    }

    impl StubDetector {
        fn new(script: Vec<(usize, Result<Vec<FaceCrop>, DetectionError>)>) -> Self {
            Self {
                script: script.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl FaceDetector for StubDetector {
        fn detect(&self, frame: &Frame) -> Result<Vec<FaceCrop>, DetectionError> {
            self.calls.lock().unwrap().push(frame.index());
            self.script
                .get(&frame.index())
                .cloned()
                .unwrap_or(Err(DetectionError::NoFace {
                    frame_index: frame.index(),
                }))
        }
    }

    /// Embeds a crop as `[frame_index, ordinal]`; fails on ordinal 99.
    struct StubEmbedder {
        calls: AtomicUsize,
    }

    impl StubEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl FaceEmbedder for StubEmbedder {
        fn embed(&self, face: &FaceCrop) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if face.ordinal == 99 {
                return Err(EmbeddingError::Backend {
                    frame_index: face.frame_index,
                    ordinal: face.ordinal,
                    reason: "boom".into(),
                });
            }
            Ok(vec![face.frame_index as f32, face.ordinal as f32])
        }
    }

    #[test]
    fn test_each_frame_detected_exactly_once() {
        let detector = StubDetector::new(vec![
            (0, Ok(vec![crop(0, 0, 1.0)])),
            (1, Ok(vec![crop(1, 0, 1.0)])),
            (2, Ok(vec![crop(2, 0, 1.0)])),
        ]);
        let embedder = StubEmbedder::new();
        let pool = BoundedWorkerPool::new(2);
        let coordinator = ExtractionCoordinator::new(&detector, &embedder, 0.9, &pool);

        let frames: Vec<Frame> = (0..3).map(frame).collect();
        let outcome = coordinator.extract(&frames).unwrap();

        let mut calls = detector.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec![0, 1, 2]);
        assert_eq!(outcome.faces.len(), 3);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.frames_processed, 3);
    }

    #[test]
    fn test_faces_merged_in_frame_order() {
        let detector = StubDetector::new(vec![
            (0, Ok(vec![crop(0, 0, 1.0), crop(0, 1, 1.0)])),
            (1, Ok(vec![crop(1, 0, 1.0)])),
            (2, Ok(vec![crop(2, 0, 1.0)])),
        ]);
        let embedder = StubEmbedder::new();
        let pool = BoundedWorkerPool::new(4);
        let coordinator = ExtractionCoordinator::new(&detector, &embedder, 0.5, &pool);

        let frames: Vec<Frame> = (0..3).map(frame).collect();
        let outcome = coordinator.extract(&frames).unwrap();

        let order: Vec<usize> = outcome.faces.iter().map(|f| f.frame_index).collect();
        assert_eq!(order, vec![0, 0, 1, 2]);
        assert_eq!(outcome.faces[1].embedding, vec![0.0, 1.0]);
    }

    #[test]
    fn test_confidence_on_threshold_kept_and_below_or_nan_dropped() {
        let detector = StubDetector::new(vec![(
            0,
            Ok(vec![crop(0, 0, 0.5), crop(0, 1, 0.999), crop(0, 2, f64::NAN)]),
        )]);
        let embedder = StubEmbedder::new();
        let pool = BoundedWorkerPool::new(1);
        let coordinator = ExtractionCoordinator::new(&detector, &embedder, 0.999, &pool);

        let outcome = coordinator.extract(&[frame(0)]).unwrap();

        assert_eq!(outcome.faces.len(), 1);
        assert_eq!(outcome.faces[0].embedding, vec![0.0, 1.0]);
        assert_eq!(outcome.rejected_low_confidence, 2);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detection_failure_does_not_block_other_frames() {
        let detector = StubDetector::new(vec![
            (0, Ok(vec![crop(0, 0, 1.0)])),
            (1, Err(DetectionError::Backend("model crashed".into()))),
            (3, Ok(vec![crop(3, 0, 1.0)])),
        ]);
        let embedder = StubEmbedder::new();
        let pool = BoundedWorkerPool::new(3);
        let coordinator = ExtractionCoordinator::new(&detector, &embedder, 0.9, &pool);

        let frames: Vec<Frame> = (0..4).map(frame).collect();
        let outcome = coordinator.extract(&frames).unwrap();

        assert_eq!(outcome.faces.len(), 2);
        assert_eq!(outcome.detection_failures, 1);
        assert_eq!(outcome.frames_without_faces, 1);
    }

    #[test]
    fn test_embedding_failure_skips_only_that_face() {
        let detector = StubDetector::new(vec![(0, Ok(vec![crop(0, 0, 1.0), crop(0, 99, 1.0)]))]);
        let embedder = StubEmbedder::new();
        let pool = BoundedWorkerPool::new(2);
        let coordinator = ExtractionCoordinator::new(&detector, &embedder, 0.9, &pool);

        let outcome = coordinator.extract(&[frame(0)]).unwrap();

        assert_eq!(outcome.faces.len(), 1);
        assert_eq!(outcome.embedding_failures, 1);
    }

    #[test]
    fn test_empty_batch_yields_no_faces() {
        let detector = StubDetector::new(vec![]);
        let embedder = StubEmbedder::new();
        let pool = BoundedWorkerPool::new(2);
        let coordinator = ExtractionCoordinator::new(&detector, &embedder, 0.9, &pool);

        let outcome = coordinator.extract(&[]).unwrap();

        assert!(outcome.faces.is_empty());
        assert!(detector.calls.lock().unwrap().is_empty());
    }
}
