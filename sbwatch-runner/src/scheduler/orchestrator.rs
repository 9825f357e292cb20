//! Job orchestrator
//!
//! Drives one job from a written script to a cleaned-up working directory:
//! submit, wait for the output log, tail it, remove both transient files.
//! Each launched job runs in its own task with its own sink and file pair.

use sbwatch_core::{JobError, JobId, JobName, JobPaths, JobScript, JobState, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::service::{OutputWatcher, SbatchSubmitter, Submitter};
use crate::sink::{Display, DisplayIdAllocator, LiveBuffer};

/// Summary of a job that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub name: JobName,
    pub job_id: JobId,
    /// Output lines shown, sentinel excluded
    pub lines: usize,
    pub state: JobState,
}

/// Handle to a job running in the background
///
/// Dropping the handle does not stop the job.
#[derive(Debug)]
pub struct JobHandle {
    name: JobName,
    cancel: CancellationToken,
    task: JoinHandle<Result<JobOutcome>>,
}

impl JobHandle {
    pub fn name(&self) -> &JobName {
        &self.name
    }

    /// Stops watching at the next poll
    ///
    /// The scheduler job itself keeps running.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this job when fired
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the job task to finish
    pub async fn wait(self) -> Result<JobOutcome> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(JobError::Aborted(e.to_string())),
        }
    }
}

/// Tracks and logs a job's state transitions
struct Progress<'a> {
    name: &'a JobName,
    state: JobState,
}

impl<'a> Progress<'a> {
    fn new(name: &'a JobName, state: JobState) -> Self {
        Self { name, state }
    }

    fn advance(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!("Job {}: {} -> {}", self.name, self.state, next);
        self.state = next;
    }
}

/// Sequences submission and watching for named jobs
pub struct JobOrchestrator {
    config: Config,
    submitter: Arc<dyn Submitter>,
    watcher: OutputWatcher,
    display: Arc<dyn Display>,
    display_ids: Arc<DisplayIdAllocator>,
}

impl JobOrchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    /// * `config` - Working directory and polling settings
    /// * `submitter` - Hands scripts to the scheduler
    /// * `display` - Where each job's live output is rendered
    /// * `display_ids` - Source of per-job display identities
    pub fn new(
        config: Config,
        submitter: Arc<dyn Submitter>,
        display: Arc<dyn Display>,
        display_ids: Arc<DisplayIdAllocator>,
    ) -> Self {
        let watcher = OutputWatcher::from_config(&config);
        Self {
            config,
            submitter,
            watcher,
            display,
            display_ids,
        }
    }

    /// Creates an orchestrator that submits with `sbatch` as configured
    pub fn from_config(config: Config, display: Arc<dyn Display>) -> Self {
        let submitter = Arc::new(SbatchSubmitter::from_config(&config));
        Self::new(
            config,
            submitter,
            display,
            Arc::new(DisplayIdAllocator::new()),
        )
    }

    pub fn paths(&self, name: &JobName) -> JobPaths {
        JobPaths::new(&self.config.work_dir, name)
    }

    /// Writes the job script into the working directory
    pub async fn prepare(&self, name: &JobName, script: &JobScript) -> Result<JobPaths> {
        let paths = self.paths(name);
        tokio::fs::write(&paths.script, script.as_str()).await?;
        debug!("Job {}: wrote {}", name, paths.script.display());
        Ok(paths)
    }

    /// Renders and writes the script, then runs the job in a new task
    ///
    /// Template errors are returned before anything touches the disk.
    pub async fn launch(
        self: &Arc<Self>,
        name: JobName,
        template: &str,
        vars: &HashMap<String, String>,
    ) -> Result<JobHandle> {
        let script = JobScript::render(template, &name, vars)?;
        self.prepare(&name, &script).await?;
        Ok(self.spawn(name))
    }

    /// Runs an already prepared job in a new task
    pub fn spawn(self: &Arc<Self>, name: JobName) -> JobHandle {
        let cancel = CancellationToken::new();
        let orchestrator = Arc::clone(self);
        let token = cancel.clone();
        let task_name = name.clone();

        let task = tokio::spawn(async move {
            let result = orchestrator.run(&task_name, token).await;
            if let Err(e) = &result {
                error!("Job {} failed: {}", task_name, e);
            }
            result
        });

        JobHandle { name, cancel, task }
    }

    /// Submits a prepared job and follows its output to completion
    ///
    /// A failed submission returns immediately and leaves the script on
    /// disk. Cancellation still removes both files.
    pub async fn run(&self, name: &JobName, cancel: CancellationToken) -> Result<JobOutcome> {
        let paths = self.paths(name);
        let mut progress = Progress::new(name, JobState::ScriptWritten);
        let mut sink = LiveBuffer::new(
            self.display_ids.allocate(),
            Arc::clone(&self.display),
            &format!("Submitting {}\n", name.script_file_name()),
        );

        if tokio::fs::try_exists(&paths.output).await? {
            info!("Removing stale output {}", paths.output.display());
            tokio::fs::remove_file(&paths.output).await?;
        }

        progress.advance(JobState::Submitting);
        let job_id = match self.submitter.submit(name, &mut sink).await {
            Ok(job_id) => job_id,
            Err(e) => {
                progress.advance(JobState::Failed);
                return Err(e);
            }
        };
        progress.advance(JobState::Submitted);

        progress.advance(JobState::WaitingForFile);
        let watched = match self.watcher.wait_for(&paths.output, &mut sink, &cancel).await {
            Ok(()) => {
                progress.advance(JobState::Tailing);
                self.watcher.tail(&paths.output, &mut sink, &cancel).await
            }
            Err(e) => Err(e),
        };

        let summary = match watched {
            Ok(summary) => summary,
            Err(JobError::Cancelled) => {
                progress.advance(JobState::Cancelled);
                warn!("Job {} ({}) cancelled while watching", name, job_id);
                cleanup(&paths).await;
                return Err(JobError::Cancelled);
            }
            Err(e) => return Err(e),
        };
        progress.advance(JobState::Done);

        cleanup(&paths).await;
        progress.advance(JobState::CleanedUp);

        info!("Job {} ({}) finished", name, job_id);

        Ok(JobOutcome {
            name: name.clone(),
            job_id,
            lines: summary.lines,
            state: progress.state,
        })
    }
}

/// Removes both transient files, logging failures
async fn cleanup(paths: &JobPaths) {
    remove_if_exists(&paths.output).await;
    remove_if_exists(&paths.script).await;
}

async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MemoryDisplay, OutputSink};
    use crate::testing::{FAKE_SBATCH, write_stub};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::time::Duration;

    /// Confirms every submission and writes `output` after `delay`
    struct FakeSubmitter {
        work_dir: PathBuf,
        output: Option<String>,
        delay: Duration,
    }

    #[async_trait]
    impl Submitter for FakeSubmitter {
        async fn submit(&self, name: &JobName, sink: &mut dyn OutputSink) -> Result<JobId> {
            let confirmation = "Submitted batch job 42\n";
            sink.append(confirmation);

            if let Some(content) = self.output.clone() {
                let path = self.work_dir.join(name.output_file_name());
                let delay = self.delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    tokio::fs::write(path, content).await.unwrap();
                });
            }

            Ok(JobId::from_confirmation(confirmation).unwrap())
        }
    }

    fn config(dir: &Path) -> Config {
        Config::new(dir).with_poll_interval(Duration::from_millis(10))
    }

    fn sbatch_orchestrator(
        dir: &Path,
        stub_body: &str,
    ) -> (Arc<JobOrchestrator>, Arc<MemoryDisplay>) {
        let stub = write_stub(dir, "fake-sbatch.sh", stub_body);
        let config = config(dir)
            .with_sbatch_program("sh")
            .with_sbatch_args([stub.to_string_lossy().into_owned()]);
        let display = Arc::new(MemoryDisplay::new());
        let orchestrator = JobOrchestrator::from_config(config, display.clone());
        (Arc::new(orchestrator), display)
    }

    fn fake_orchestrator(
        dir: &Path,
        output: Option<&str>,
    ) -> (Arc<JobOrchestrator>, Arc<MemoryDisplay>) {
        let submitter = Arc::new(FakeSubmitter {
            work_dir: dir.to_path_buf(),
            output: output.map(str::to_string),
            delay: Duration::from_millis(50),
        });
        let display = Arc::new(MemoryDisplay::new());
        let orchestrator = JobOrchestrator::new(
            config(dir),
            submitter,
            display.clone(),
            Arc::new(DisplayIdAllocator::new()),
        );
        (Arc::new(orchestrator), display)
    }

    fn job(name: &str) -> JobName {
        JobName::new(name).unwrap()
    }

    fn last_render(display: &MemoryDisplay) -> String {
        display.renders().last().map(|(_, text)| text.clone()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_prepare_writes_rendered_script() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, _) = fake_orchestrator(dir.path(), None);
        let name = job("job1");
        let script = JobScript::render("run --x\n", &name, &HashMap::new()).unwrap();

        let paths = orchestrator.prepare(&name, &script).await.unwrap();

        assert_eq!(paths.script, dir.path().join("job1.sbatch"));
        assert_eq!(
            std::fs::read_to_string(&paths.script).unwrap(),
            "run --x\necho\n echo \"[SBATCH-DONE]\"\n"
        );
    }

    #[tokio::test]
    async fn test_full_run_with_stub_scheduler() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, display) = sbatch_orchestrator(dir.path(), FAKE_SBATCH);

        let handle = orchestrator
            .launch(job("job1"), "echo hello\necho {name} world\n", &HashMap::new())
            .await
            .unwrap();
        assert_eq!(handle.name().as_str(), "job1");

        let outcome = handle.wait().await.unwrap();

        assert_eq!(outcome.job_id.as_str(), "42");
        assert_eq!(outcome.lines, 3);
        assert_eq!(outcome.state, JobState::CleanedUp);
        assert_eq!(
            last_render(&display),
            format!(
                "Submitting job1.sbatch\nSubmitted batch job 42\nWaiting for {}...\nhello\njob1 world\n\nDone!",
                dir.path().join("job1.out").display()
            )
        );
        assert!(!dir.path().join("job1.sbatch").exists());
        assert!(!dir.path().join("job1.out").exists());

        let args = std::fs::read_to_string(dir.path().join("last-args.txt")).unwrap();
        assert_eq!(args, "--job-name=job1\n--output=job1.out\njob1.sbatch\n");
    }

    #[tokio::test]
    async fn test_stale_output_is_removed_before_watching() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("job1.out"), "old line\n[SBATCH-DONE]\n").unwrap();
        let (orchestrator, display) =
            fake_orchestrator(dir.path(), Some("new line\n[SBATCH-DONE]\n"));

        let outcome = orchestrator
            .launch(job("job1"), "true\n", &HashMap::new())
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert_eq!(outcome.lines, 1);
        let text = last_render(&display);
        assert!(text.contains("new line\n"));
        assert!(!text.contains("old line"));
    }

    #[tokio::test]
    async fn test_failed_submission_stops_before_watching() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, display) =
            sbatch_orchestrator(dir.path(), "echo 'sbatch: error: Batch job submission failed'\n");

        let err = orchestrator
            .launch(job("job1"), "true\n", &HashMap::new())
            .await
            .unwrap()
            .wait()
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Submission { .. }));
        assert!(err.to_string().starts_with("Invalid job submission output"));

        let text = last_render(&display);
        assert!(text.ends_with("Batch job submission failed\n"));
        assert!(!text.contains("Waiting for"));
        // the script stays behind for inspection
        assert!(dir.path().join("job1.sbatch").exists());
    }

    #[tokio::test]
    async fn test_template_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, display) = fake_orchestrator(dir.path(), None);

        let err = orchestrator
            .launch(job("job1"), "echo {undefined}\n", &HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Template(_)));
        assert!(!dir.path().join("job1.sbatch").exists());
        assert!(display.renders().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, display) = fake_orchestrator(dir.path(), None);

        let handle = orchestrator
            .launch(job("job1"), "sleep 600\n", &HashMap::new())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();

        let err = handle.wait().await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(!dir.path().join("job1.sbatch").exists());
        assert!(!last_render(&display).contains("Done!"));
    }

    #[tokio::test]
    async fn test_concurrent_jobs_get_own_display() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, display) =
            fake_orchestrator(dir.path(), Some("line\n[SBATCH-DONE]\n"));

        let first = orchestrator
            .launch(job("first"), "true\n", &HashMap::new())
            .await
            .unwrap();
        let second = orchestrator
            .launch(job("second"), "true\n", &HashMap::new())
            .await
            .unwrap();

        first.wait().await.unwrap();
        second.wait().await.unwrap();

        let mut ids: Vec<u64> = display.renders().iter().map(|(id, _)| id.get()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids, vec![1, 2]);

        for (id, banner) in display
            .renders()
            .iter()
            .filter(|(_, text)| text.starts_with("Submitting"))
        {
            let latest = display.latest(*id).unwrap();
            assert!(latest.starts_with(banner.as_str()));
            assert!(latest.ends_with("line\nDone!"));
        }
    }
}
