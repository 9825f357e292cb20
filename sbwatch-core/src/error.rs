//! Error types for sbwatch

use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for job operations
pub type Result<T> = std::result::Result<T, JobError>;

/// Errors that can end a job
#[derive(Debug, Error)]
pub enum JobError {
    /// Job name was rejected before any file or process work
    #[error("Invalid job name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Script template could not be rendered
    #[error("Failed to render job script: {0}")]
    Template(#[from] TemplateError),

    /// Scheduler did not confirm the submission
    #[error("Invalid job submission output (exit status {status}): {stdout}")]
    Submission {
        /// Exit status of the scheduler process
        status: ExitStatus,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// File or process I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The job was cancelled while watching its output
    #[error("Job cancelled")]
    Cancelled,

    /// The background task running the job panicked or was aborted
    #[error("Job task aborted: {0}")]
    Aborted(String),
}

impl JobError {
    /// Create an invalid name error
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }

    /// Check if this error came from a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised while rendering a script template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A placeholder names a key with no binding
    #[error("no value for placeholder '{{{0}}}'")]
    UnknownKey(String),

    /// A `{` was never closed
    #[error("unclosed '{{' at byte {0}")]
    Unclosed(usize),

    /// A `}` appeared without a matching `{`
    #[error("single '}}' encountered at byte {0}")]
    StrayClose(usize),
}
