pub mod identity;
pub mod identity_matcher;
pub mod reference_gallery;
