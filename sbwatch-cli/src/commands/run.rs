//! `run` command: job name as an argument, template from a file or stdin

use anyhow::Result;
use sbwatch_core::JobName;
use sbwatch_runner::Config;
use std::path::PathBuf;

use super::job::{JobArgs, execute_job, read_input};

pub async fn handle_run_command(
    name: String,
    template: Option<PathBuf>,
    args: JobArgs,
    config: Config,
) -> Result<()> {
    // Validate before reading stdin so a bad name fails fast
    let name = JobName::new(name)?;
    let template = read_input(template.as_deref()).await?;
    execute_job(name, &template, args, config).await
}
