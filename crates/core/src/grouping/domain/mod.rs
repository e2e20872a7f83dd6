pub mod face_verifier;
pub mod group_builder;
pub mod match_edge;
