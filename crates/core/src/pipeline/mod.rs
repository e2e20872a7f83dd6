pub mod batch_task;
pub mod comparison_coordinator;
pub mod extraction_coordinator;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod resolve_identity_use_case;
