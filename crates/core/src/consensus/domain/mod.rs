pub mod consensus_aggregator;
pub mod scoreboard;
