/// Minimum detector confidence for a face to enter the pipeline.
pub const DEFAULT_MIN_FACE_CONFIDENCE: f64 = 0.999;

/// Upper bound on concurrent extraction/comparison workers.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Distance samples an identity needs before it may win consensus.
pub const DEFAULT_MIN_EVIDENCE: usize = 3;

/// Number of lowest distances averaged into a consensus score.
pub const DEFAULT_TRIM_COUNT: usize = 4;

/// ArcFace cosine-distance cut-off for "same person".
pub const DEFAULT_VERIFICATION_THRESHOLD: f64 = 0.68;
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.68;

pub const CONFIG_DIR_NAME: &str = "face-consensus";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const ACTIVITY_LOG_FILE: &str = "activity.csv";
