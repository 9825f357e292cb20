//! Service layer
//!
//! The two halves of a job's life: handing the script to the scheduler and
//! following the log it produces. Submission is trait-based so the
//! orchestrator can be driven by other schedulers in tests.

mod submitter;
mod watcher;

pub use submitter::{CONFIRMATION_PREFIX, SbatchSubmitter, Submitter};
pub use watcher::{OutputWatcher, WatchSummary};
