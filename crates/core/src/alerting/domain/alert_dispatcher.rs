use std::path::PathBuf;

use thiserror::Error;

use crate::alerting::domain::alert::Alert;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize alert: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("alert image is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Domain interface for delivering a match to the people who act on it.
pub trait AlertDispatcher: Send + Sync {
    fn notify(&self, alert: &Alert) -> Result<(), AlertError>;
}
