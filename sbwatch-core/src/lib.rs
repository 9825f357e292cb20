//! sbwatch Core
//!
//! Core types shared by the sbwatch runner and CLI.
//!
//! This crate contains:
//! - Domain types: job names, job ids, derived file paths and the job state machine
//! - Script rendering: turning a templated body into a batch script
//! - Error types used across the workspace

pub mod domain;
pub mod error;

pub use domain::job::{JobId, JobName, JobPaths, JobState};
pub use domain::script::{JobScript, SENTINEL};
pub use error::{JobError, Result, TemplateError};
