pub mod gallery_matcher;
