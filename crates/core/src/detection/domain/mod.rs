pub mod detected_face;
pub mod face_crop;
pub mod face_detector;
pub mod face_embedder;
