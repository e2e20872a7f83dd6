pub mod recorded_detections;
