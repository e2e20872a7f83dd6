use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::face_crop::FaceCrop;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::detection::domain::face_embedder::{EmbeddingError, FaceEmbedder};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("failed to read detections {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse detections: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One face as captured by an earlier detection + embedding pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedFace {
    pub confidence: f64,
    pub bounding_box: BoundingBox,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct RecordingFile {
    #[serde(default)]
    frames: HashMap<usize, Vec<RecordedFace>>,
}

/// Replays pre-computed detections and embeddings by frame index.
///
/// Lets the consensus pipeline run offline against captures from the
/// camera fleet. A frame with nothing recorded behaves like a detector
/// that enforces detection: it reports [`DetectionError::NoFace`].
#[derive(Clone)]
pub struct RecordedDetections {
    frames: Arc<HashMap<usize, Vec<RecordedFace>>>,
}

impl RecordedDetections {
    pub fn new(frames: HashMap<usize, Vec<RecordedFace>>) -> Self {
        Self {
            frames: Arc::new(frames),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RecordingError> {
        let file: RecordingFile = serde_json::from_str(json)?;
        Ok(Self::new(file.frames))
    }

    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        let json = fs::read_to_string(path).map_err(|e| RecordingError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&json)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl FaceDetector for RecordedDetections {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceCrop>, DetectionError> {
        let faces = match self.frames.get(&frame.index()) {
            Some(faces) if !faces.is_empty() => faces,
            _ => {
                return Err(DetectionError::NoFace {
                    frame_index: frame.index(),
                })
            }
        };

        Ok(faces
            .iter()
            .enumerate()
            .map(|(ordinal, face)| FaceCrop {
                frame_index: frame.index(),
                ordinal,
                confidence: face.confidence,
                bounding_box: face.bounding_box,
                crop: frame.crop(&face.bounding_box),
            })
            .collect())
    }
}

impl FaceEmbedder for RecordedDetections {
    fn embed(&self, face: &FaceCrop) -> Result<Vec<f32>, EmbeddingError> {
        self.frames
            .get(&face.frame_index)
            .and_then(|faces| faces.get(face.ordinal))
            .map(|recorded| recorded.embedding.clone())
            .ok_or_else(|| EmbeddingError::Backend {
                frame_index: face.frame_index,
                ordinal: face.ordinal,
                reason: "no recorded embedding".into(),
            })
    }
}
