//! Output watcher
//!
//! Follows a job's output log while the job is running. The log is written
//! by a process we do not control, so the watcher polls: first for the file
//! to appear, then for new complete lines at the current read position.

use sbwatch_core::{JobError, Result, SENTINEL};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::sink::OutputSink;

/// Appended to the sink once the sentinel is seen
const DONE_NOTICE: &str = "Done!";

/// Result of a completed watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSummary {
    /// Lines forwarded to the sink, sentinel excluded
    pub lines: usize,
}

/// Tails an output file until the sentinel line shows up
#[derive(Debug, Clone)]
pub struct OutputWatcher {
    poll_interval: Duration,
}

impl OutputWatcher {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval)
    }

    /// Watches `path`, forwarding each complete line to `sink`
    ///
    /// There is no timeout. Fire `cancel` to give up; it is checked on every
    /// poll.
    pub async fn watch(
        &self,
        path: &Path,
        sink: &mut dyn OutputSink,
        cancel: &CancellationToken,
    ) -> Result<WatchSummary> {
        self.wait_for(path, sink, cancel).await?;
        self.tail(path, sink, cancel).await
    }

    /// Announces the wait on `sink` and polls until `path` exists
    pub async fn wait_for(
        &self,
        path: &Path,
        sink: &mut dyn OutputSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        sink.append(&format!("Waiting for {}...\n", path.display()));

        while !tokio::fs::try_exists(path).await? {
            self.pause(cancel).await?;
        }

        debug!("Output file {} appeared", path.display());
        Ok(())
    }

    /// Reads `path` from the start until a line holding the sentinel
    ///
    /// Lines before the sentinel go to `sink`; the sentinel line does not.
    pub async fn tail(
        &self,
        path: &Path,
        sink: &mut dyn OutputSink,
        cancel: &CancellationToken,
    ) -> Result<WatchSummary> {
        let mut reader = BufReader::new(File::open(path).await?);
        let mut line = Vec::new();
        let mut lines = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(JobError::Cancelled);
            }

            // read_until appends, so a partial line stays in `line` and is
            // completed on a later pass
            reader.read_until(b'\n', &mut line).await?;

            if line.last() != Some(&b'\n') {
                self.pause(cancel).await?;
                continue;
            }

            let text = String::from_utf8_lossy(&line).into_owned();
            if text.contains(SENTINEL) {
                break;
            }

            sink.append(&text);
            lines += 1;
            line.clear();
        }

        sink.append(DONE_NOTICE);
        info!("Finished watching {} ({} lines)", path.display(), lines);

        Ok(WatchSummary { lines })
    }

    async fn pause(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(JobError::Cancelled),
            _ = tokio::time::sleep(self.poll_interval) => Ok(()),
        }
    }
}
