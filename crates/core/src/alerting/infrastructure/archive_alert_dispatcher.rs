use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::alerting::domain::alert::Alert;
use crate::alerting::domain::alert_dispatcher::{AlertDispatcher, AlertError};
use crate::shared::constants::ACTIVITY_LOG_FILE;

pub const ALERT_FILE_NAME: &str = "alert.json";
pub const EVIDENCE_FILE_NAME: &str = "person_in_store.jpg";
pub const REFERENCE_FILE_NAME: &str = "match.jpg";

/// Files each alert under `root` for later review.
///
/// Layout per alert: `<root>/<unix-secs>-<seq>-<identity>/` holding
/// `alert.json`, the evidence frame and the reference photo. Every alert
/// also appends `<identity>,<unix-secs>` to `<root>/activity.csv`.
pub struct ArchiveAlertDispatcher {
    root: PathBuf,
    sequence: AtomicUsize,
}

impl ArchiveAlertDispatcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sequence: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_file(path: &Path, contents: &[u8]) -> Result<(), AlertError> {
        fs::write(path, contents).map_err(|e| AlertError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn append_activity(&self, alert: &Alert, stamp: u64) -> Result<(), AlertError> {
        let path = self.root.join(ACTIVITY_LOG_FILE);
        let io_err = |e| AlertError::Io {
            path: path.clone(),
            source: e,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        writeln!(file, "{},{}", alert.identity_id, stamp).map_err(io_err)
    }
}

impl AlertDispatcher for ArchiveAlertDispatcher {
    fn notify(&self, alert: &Alert) -> Result<(), AlertError> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let dir = self
            .root
            .join(format!("{stamp}-{seq}-{}", alert.identity_id));
        fs::create_dir_all(&dir).map_err(|e| AlertError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let json = serde_json::to_string_pretty(alert)?;
        Self::write_file(&dir.join(ALERT_FILE_NAME), json.as_bytes())?;

        if !alert.evidence_image.is_empty() {
            let bytes = STANDARD.decode(alert.evidence_image.trim())?;
            Self::write_file(&dir.join(EVIDENCE_FILE_NAME), &bytes)?;
        }
        if let Some(reference) = alert.reference_image() {
            let bytes = STANDARD.decode(reference.trim())?;
            Self::write_file(&dir.join(REFERENCE_FILE_NAME), &bytes)?;
        }

        self.append_activity(alert, stamp)?;
        log::info!("Archived alert for {} in {}", alert.display_name(), dir.display());
        Ok(())
    }
}
