pub mod archive_alert_dispatcher;
pub mod log_alert_dispatcher;
