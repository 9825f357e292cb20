//! Job domain types

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{JobError, Result};

/// Extension of the generated batch script
pub const SCRIPT_EXTENSION: &str = "sbatch";

/// Extension of the scheduler's output log
pub const OUTPUT_EXTENSION: &str = "out";

/// Validated job name
///
/// A name is a single token that becomes the stem of both transient files,
/// so it cannot carry an extension or a directory component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobName(String);

impl JobName {
    /// Validates and wraps a job name
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(JobError::invalid_name(name, "name is required"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(JobError::invalid_name(name, "name must be a single word"));
        }
        if name.contains('.') {
            return Err(JobError::invalid_name(name, "do not include extension"));
        }
        if name.contains(['/', '\\']) {
            return Err(JobError::invalid_name(
                name,
                "name must not contain a path separator",
            ));
        }

        Ok(Self(name))
    }

    /// Parses the name line of a cell
    ///
    /// The line must hold exactly one whitespace-delimited token.
    pub fn from_line(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(name), None) => Self::new(name),
            (None, _) => Err(JobError::invalid_name(line, "name is required")),
            (Some(_), Some(_)) => Err(JobError::invalid_name(line, "name must be a single word")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<name>.sbatch`
    pub fn script_file_name(&self) -> String {
        format!("{}.{}", self.0, SCRIPT_EXTENSION)
    }

    /// `<name>.out`
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", self.0, OUTPUT_EXTENSION)
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scheduler-assigned job identifier
///
/// Opaque; taken verbatim from the submission confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    /// Extracts the identifier from scheduler output
    ///
    /// The identifier is the last whitespace-delimited word.
    pub fn from_confirmation(stdout: &str) -> Option<Self> {
        stdout.split_whitespace().last().map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two transient files owned by a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    /// Generated batch script
    pub script: PathBuf,
    /// Output log written by the running job
    pub output: PathBuf,
}

impl JobPaths {
    /// Derives the file pair for `name` inside `work_dir`
    pub fn new(work_dir: &Path, name: &JobName) -> Self {
        Self {
            script: work_dir.join(name.script_file_name()),
            output: work_dir.join(name.output_file_name()),
        }
    }
}

/// Lifecycle of a single submitted job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    ScriptWritten,
    Submitting,
    Submitted,
    WaitingForFile,
    Tailing,
    Done,
    CleanedUp,
    Failed,
    Cancelled,
}

impl JobState {
    /// Terminal states allow no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::CleanedUp | Self::Failed | Self::Cancelled)
    }

    /// Checks whether `next` directly follows `self`
    pub fn can_advance_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Idle, ScriptWritten)
                | (ScriptWritten, Submitting)
                | (Submitting, Submitted)
                | (Submitting, Failed)
                | (Submitted, WaitingForFile)
                | (WaitingForFile, Tailing)
                | (WaitingForFile, Cancelled)
                | (Tailing, Done)
                | (Tailing, Cancelled)
                | (Done, CleanedUp)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::ScriptWritten => "script-written",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
            Self::WaitingForFile => "waiting-for-file",
            Self::Tailing => "tailing",
            Self::Done => "done",
            Self::CleanedUp => "cleaned-up",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}
