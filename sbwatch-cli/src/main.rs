//! sbwatch CLI
//!
//! Submits a templated batch script to the cluster scheduler and streams the
//! job's output to the terminal until it finishes.

mod commands;
mod display;

use anyhow::{Context, Result};
use clap::Parser;
use sbwatch_runner::Config;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{Commands, handle_command};

#[derive(Parser)]
#[command(name = "sbwatch")]
#[command(about = "Submit a batch job and follow its output", long_about = None)]
struct Cli {
    /// Directory for the generated script and output log [env: SBWATCH_WORK_DIR]
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Scheduler submission program [env: SBWATCH_SBATCH]
    #[arg(long, global = true)]
    sbatch: Option<PathBuf>,

    /// Extra argument for the submission program, repeatable [env: SBWATCH_SBATCH_ARGS]
    #[arg(long = "sbatch-arg", global = true, allow_hyphen_values = true)]
    sbatch_args: Vec<String>,

    /// Output poll interval in milliseconds [env: SBWATCH_POLL_INTERVAL_MS]
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Environment settings overridden by explicit flags
    fn config(&self) -> Result<Config> {
        let mut config = Config::from_env().context("Failed to load configuration")?;

        if let Some(work_dir) = &self.work_dir {
            config.work_dir = work_dir.clone();
        }
        if let Some(program) = &self.sbatch {
            config.sbatch_program = program.clone();
        }
        if !self.sbatch_args.is_empty() {
            config.sbatch_args = self.sbatch_args.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = std::time::Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries job output only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sbwatch_runner=info,sbwatch_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    debug!("Loaded configuration: {:?}", config);

    handle_command(cli.command, config).await
}
