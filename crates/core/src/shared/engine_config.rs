use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alerting::domain::alert::AlertChannel;
use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_WORKERS,
    DEFAULT_MIN_EVIDENCE, DEFAULT_MIN_FACE_CONFIDENCE, DEFAULT_TRIM_COUNT,
    DEFAULT_VERIFICATION_THRESHOLD,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for one pipeline invocation.
///
/// Worker count only affects latency; every other field changes which
/// faces, edges and identities count as evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_face_confidence: f64,
    pub max_workers: usize,
    pub min_evidence: usize,
    pub trim_count: usize,
    pub verification_threshold: f64,
    pub match_threshold: f64,
    pub validate_symmetry: bool,
    pub alert_channel: AlertChannel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_face_confidence: DEFAULT_MIN_FACE_CONFIDENCE,
            max_workers: DEFAULT_MAX_WORKERS,
            min_evidence: DEFAULT_MIN_EVIDENCE,
            trim_count: DEFAULT_TRIM_COUNT,
            verification_threshold: DEFAULT_VERIFICATION_THRESHOLD,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            validate_symmetry: false,
            alert_channel: AlertChannel::Email,
        }
    }
}

impl EngineConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads and validates a JSON config. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig =
            serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the per-user config if one exists, otherwise the defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_face_confidence) {
            return Err(ConfigError::Invalid(format!(
                "min_face_confidence must be between 0.0 and 1.0, got {}",
                self.min_face_confidence
            )));
        }
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be >= 1".into()));
        }
        if self.min_evidence == 0 {
            return Err(ConfigError::Invalid("min_evidence must be >= 1".into()));
        }
        if self.trim_count < self.min_evidence {
            return Err(ConfigError::Invalid(format!(
                "trim_count ({}) must be >= min_evidence ({})",
                self.trim_count, self.min_evidence
            )));
        }
        for (name, value) in [
            ("verification_threshold", self.verification_threshold),
            ("match_threshold", self.match_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
