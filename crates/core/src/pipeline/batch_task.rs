use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::pipeline::resolve_identity_use_case::BatchReport;

/// Lifecycle of one submitted batch. Transitions only move forward.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    Submitted,
    Running,
    Completed(BatchReport),
    Failed(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed(_) | TaskStatus::Failed(_))
    }
}

/// Handle to a batch running on its own background thread.
///
/// The status stays observable while the job runs, so a stuck or failed
/// batch is visible to whoever holds the handle.
pub struct BatchTask {
    id: u64,
    status: Arc<Mutex<TaskStatus>>,
    handle: Option<JoinHandle<()>>,
}

impl BatchTask {
    /// Starts `job` on a new thread. A panic inside the job is reported
    /// as [`TaskStatus::Failed`].
    pub fn spawn<F>(id: u64, job: F) -> Self
    where
        F: FnOnce() -> Result<BatchReport, String> + Send + 'static,
    {
        let status = Arc::new(Mutex::new(TaskStatus::Submitted));
        let shared = status.clone();

        let handle = thread::spawn(move || {
            *lock(&shared) = TaskStatus::Running;
            let final_status = match panic::catch_unwind(AssertUnwindSafe(job)) {
                Ok(Ok(report)) => TaskStatus::Completed(report),
                Ok(Err(e)) => {
                    log::error!("Batch {id} failed: {e}");
                    TaskStatus::Failed(e)
                }
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    log::error!("Batch {id} panicked: {reason}");
                    TaskStatus::Failed(format!("panicked: {reason}"))
                }
            };
            *lock(&shared) = final_status;
        });

        Self {
            id,
            status,
            handle: Some(handle),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> TaskStatus {
        lock(&self.status).clone()
    }

    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Blocks until the job is done and returns its final status.
    pub fn wait(mut self) -> TaskStatus {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return TaskStatus::Failed("batch thread terminated abnormally".into());
            }
        }
        self.status()
    }
}

fn lock(status: &Mutex<TaskStatus>) -> MutexGuard<'_, TaskStatus> {
    status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::domain::consensus_aggregator::ConsensusDecision;
    use crossbeam_channel::bounded;

    fn report() -> BatchReport {
        BatchReport {
            device_id: 1,
            decision: ConsensusDecision::NoMatch,
            frame_count: 2,
            face_count: 0,
            edge_count: 0,
            group_count: 0,
            candidate_count: 0,
            frames_without_faces: 2,
            detection_failures: 0,
            rejected_low_confidence: 0,
            embedding_failures: 0,
            incomparable_pairs: 0,
            verification_failures: 0,
            match_failures: 0,
            standings: vec![],
            alert_delivered: None,
        }
    }

    #[test]
    fn test_completed_job_reports_its_result() {
        let task = BatchTask::spawn(5, || Ok(report()));
        assert_eq!(task.id(), 5);
        assert_eq!(task.wait(), TaskStatus::Completed(report()));
    }

    #[test]
    fn test_failed_job_reports_error() {
        let task = BatchTask::spawn(1, || Err("worker pool collapsed".to_string()));
        assert_eq!(
            task.wait(),
            TaskStatus::Failed("worker pool collapsed".to_string())
        );
    }

    #[test]
    fn test_panicking_job_reports_failed() {
        let task = BatchTask::spawn(1, || panic!("detector exploded"));
        match task.wait() {
            TaskStatus::Failed(reason) => assert!(reason.contains("detector exploded")),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn test_status_is_observable_while_running() {
        let (started_tx, started_rx) = bounded::<()>(0);
        let (release_tx, release_rx) = bounded::<()>(0);
        let task = BatchTask::spawn(2, move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            Ok(report())
        });

        started_rx.recv().unwrap();
        assert_eq!(task.status(), TaskStatus::Running);
        assert!(!task.is_finished());

        release_tx.send(()).unwrap();
        assert!(matches!(task.wait(), TaskStatus::Completed(_)));
    }
}
