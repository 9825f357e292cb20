//! Scheduler layer for the runner
//!
//! Coordinates the lifecycle of a job from its written script to the
//! removal of its transient files.

pub mod orchestrator;

pub use orchestrator::{JobHandle, JobOrchestrator, JobOutcome};
