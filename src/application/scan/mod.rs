//! Scan fan-out: orchestrator, per-job tracker and configuration.

mod config;
mod orchestrator;
mod tracker;

pub use config::ScanConfig;
pub use orchestrator::ScanOrchestrator;
pub use tracker::{ChannelProgress, JobOutcome, SubtaskTracker, TrackerEvent};
