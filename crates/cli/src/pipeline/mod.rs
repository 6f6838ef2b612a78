//! Capture orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{CapturePipeline, PipelineConfig};
pub use stats::RunStats;
