//! Runner configuration
//!
//! Defines where jobs run, which scheduler binary submits them and how often
//! the watcher polls their output.

use std::path::PathBuf;
use std::time::Duration;

/// Default scheduler submission program
pub const DEFAULT_SBATCH: &str = "sbatch";

/// Default interval between output polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the generated scripts and output logs.
    /// The scheduler is started with this as its working directory.
    pub work_dir: PathBuf,

    /// Program invoked to submit a script
    pub sbatch_program: PathBuf,

    /// Extra arguments passed before the job's own (e.g. `--partition=gpu`)
    pub sbatch_args: Vec<String>,

    /// How often the watcher checks for the output file and for new lines
    pub poll_interval: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            sbatch_program: PathBuf::from(DEFAULT_SBATCH),
            sbatch_args: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - SBWATCH_WORK_DIR (default: current directory)
    /// - SBWATCH_SBATCH (default: sbatch)
    /// - SBWATCH_SBATCH_ARGS (whitespace-separated, default: none)
    /// - SBWATCH_POLL_INTERVAL_MS (default: 500)
    pub fn from_env() -> anyhow::Result<Self> {
        let work_dir = std::env::var_os("SBWATCH_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let sbatch_program = std::env::var_os("SBWATCH_SBATCH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SBATCH));

        let sbatch_args = std::env::var("SBWATCH_SBATCH_ARGS")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let poll_interval = match std::env::var("SBWATCH_POLL_INTERVAL_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| anyhow::anyhow!("Invalid SBWATCH_POLL_INTERVAL_MS '{}': {}", raw, e))?,
            Err(_) => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            work_dir,
            sbatch_program,
            sbatch_args,
            poll_interval,
        })
    }

    pub fn with_sbatch_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.sbatch_program = program.into();
        self
    }

    pub fn with_sbatch_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sbatch_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sbatch_program.as_os_str().is_empty() {
            anyhow::bail!("sbatch_program cannot be empty");
        }

        if self.work_dir.as_os_str().is_empty() {
            anyhow::bail!("work_dir cannot be empty");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(".")
    }
}
