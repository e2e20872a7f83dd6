//! Upload contract: one or more base64 encoded images plus the device
//! that captured them.
//!
//! Validation is the only place a batch can be rejected. Anything past
//! `validate` is absorbed by the pipeline and shows up only in logs and
//! the final report.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to read batch file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed batch request: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("batch contains no images")]
    NoImages,
    #[error("batch is missing a device id")]
    MissingDeviceId,
    #[error("image {index} is not valid base64: {source}")]
    InvalidEncoding {
        index: usize,
        source: base64::DecodeError,
    },
    #[error("image {index} could not be decoded: {source}")]
    UndecodableImage {
        index: usize,
        source: image::ImageError,
    },
}

/// Raw upload body, as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchRequest {
    pub images: Vec<String>,
    pub device_id: Option<u64>,
}

/// A batch that passed validation, with every image decoded to RGB.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub device_id: u64,
    /// First image of the batch, still base64 encoded.
    pub evidence_image: String,
    pub frames: Vec<Frame>,
}

impl ValidatedBatch {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Synchronous acknowledgment handed back before the pipeline runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchAck {
    pub task_id: u64,
    pub frame_count: usize,
    pub message: String,
}

impl BatchAck {
    pub fn new(task_id: u64, frame_count: usize) -> Self {
        Self {
            task_id,
            frame_count,
            message: format!("{frame_count} files uploaded and processed"),
        }
    }
}

impl BatchRequest {
    pub fn from_json(json: &str) -> Result<Self, BatchError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let contents = std::fs::read_to_string(path).map_err(|source| BatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Checks required fields and decodes every image.
    pub fn validate(self) -> Result<ValidatedBatch, BatchError> {
        if self.images.is_empty() {
            return Err(BatchError::NoImages);
        }
        let device_id = self.device_id.ok_or(BatchError::MissingDeviceId)?;

        let frames = self
            .images
            .iter()
            .enumerate()
            .map(|(index, encoded)| decode_frame(index, encoded))
            .collect::<Result<Vec<_>, _>>()?;

        let evidence_image = self.images.into_iter().next().unwrap_or_default();
        Ok(ValidatedBatch {
            device_id,
            evidence_image,
            frames,
        })
    }
}

fn decode_frame(index: usize, encoded: &str) -> Result<Frame, BatchError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|source| BatchError::InvalidEncoding { index, source })?;
    let rgb = image::load_from_memory(&bytes)
        .map_err(|source| BatchError::UndecodableImage { index, source })?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height, 3, index))
}
