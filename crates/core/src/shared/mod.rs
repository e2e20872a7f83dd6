pub mod bounding_box;
pub mod constants;
pub mod engine_config;
pub mod frame;
pub mod math;
