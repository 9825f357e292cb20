//! sbwatch Runner
//!
//! Submits batch scripts to a cluster scheduler and live-tails their output.
//!
//! Architecture:
//! - Configuration: settings from the environment or defaults
//! - Sinks: append-only live buffers rendered to a display surface
//! - Services: submission through `sbatch` and output watching
//! - Scheduler: per-job orchestration in background tasks
//!
//! A job's output log is written by the scheduler, not by us, so it is
//! followed by polling until the sentinel line printed by the generated
//! script appears.

pub mod config;
pub mod scheduler;
pub mod service;
pub mod sink;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use scheduler::{JobHandle, JobOrchestrator, JobOutcome};
pub use service::{OutputWatcher, SbatchSubmitter, Submitter, WatchSummary};
pub use sink::{Display, DisplayId, DisplayIdAllocator, LiveBuffer, MemoryDisplay, OutputSink};
