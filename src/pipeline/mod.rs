pub mod runner;
pub mod stats;

pub use runner::{Pipeline, PipelineState};
pub use stats::{PipelineReport, PipelineStats, StopReason};
