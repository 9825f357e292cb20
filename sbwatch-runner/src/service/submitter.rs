//! Submission service
//!
//! Hands a generated script to the cluster scheduler and extracts the job id
//! from its confirmation line.

use async_trait::async_trait;
use sbwatch_core::{JobError, JobId, JobName, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::sink::OutputSink;

/// Text every successful submission prints before the job id
pub const CONFIRMATION_PREFIX: &str = "Submitted batch job ";

/// Service trait for submitting a job script
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submits the script for `name`
    ///
    /// Forwards the scheduler's output to `sink` and returns the id the
    /// scheduler assigned.
    async fn submit(&self, name: &JobName, sink: &mut dyn OutputSink) -> Result<JobId>;
}

/// Submitter backed by the `sbatch` command
#[derive(Debug, Clone)]
pub struct SbatchSubmitter {
    program: PathBuf,
    extra_args: Vec<String>,
    work_dir: PathBuf,
}

impl SbatchSubmitter {
    pub fn new(program: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            work_dir: work_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.sbatch_program.clone(),
            extra_args: config.sbatch_args.clone(),
            work_dir: config.work_dir.clone(),
        }
    }

    fn command(&self, name: &JobName) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.extra_args)
            .arg(format!("--job-name={}", name))
            .arg(format!("--output={}", name.output_file_name()))
            .arg(name.script_file_name())
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Submitter for SbatchSubmitter {
    async fn submit(&self, name: &JobName, sink: &mut dyn OutputSink) -> Result<JobId> {
        debug!(
            "Running {} for job {} in {}",
            self.program.display(),
            name,
            self.work_dir.display()
        );

        let output = self.command(name).output().await.map_err(|e| {
            error!("Failed to run {}: {}", self.program.display(), e);
            JobError::Io(e)
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        sink.append(&stdout);

        if !stderr.trim().is_empty() {
            warn!("Scheduler stderr for job {}: {}", name, stderr.trim());
        }

        let job_id = stdout
            .contains(CONFIRMATION_PREFIX)
            .then(|| JobId::from_confirmation(&stdout))
            .flatten();

        match job_id {
            Some(job_id) => {
                info!("Job {} submitted as {}", name, job_id);
                Ok(job_id)
            }
            None => {
                error!(
                    "Submission of job {} not confirmed (status {})",
                    name, output.status
                );
                Err(JobError::Submission {
                    status: output.status,
                    stdout,
                    stderr,
                })
            }
        }
    }
}
