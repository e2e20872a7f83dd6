pub mod alerting;
pub mod batch;
pub mod consensus;
pub mod detection;
pub mod grouping;
pub mod matching;
pub mod pipeline;
pub mod shared;
