use crate::alerting::domain::alert::Alert;
use crate::alerting::domain::alert_dispatcher::{AlertDispatcher, AlertError};

/// Reports alerts through the `log` facade only.
///
/// Used when no delivery backend is configured, so a match is never
/// silently dropped.
pub struct LogAlertDispatcher;

impl AlertDispatcher for LogAlertDispatcher {
    fn notify(&self, alert: &Alert) -> Result<(), AlertError> {
        let recipients: Vec<&str> = alert.recipients.iter().map(|r| r.name.as_str()).collect();
        log::warn!(
            "ALERT [{}] {} identified by device {} (score {:.4}) for [{}]",
            alert.channel,
            alert.display_name(),
            alert.device_id,
            alert.score,
            recipients.join(", ")
        );
        for (label, value) in alert.details() {
            log::warn!("  {label}: {value}");
        }
        Ok(())
    }
}
