//! Export job polling.
//!
//! ```text
//! Submitted -> Polling -> { Completed | Failed | TimedOut }
//! ```
//!
//! Status reads are strictly sequential. The timeout budget is only checked
//! between reads; an in-flight status call always runs to completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::domain::{ExportJob, ExportStatus, JobStatus};
use crate::ReportingError;

/// Anything that can read the status of an export job.
pub trait StatusSource: Send + Sync {
    fn status<'a>(
        &'a self,
        job: &'a ExportJob,
    ) -> Pin<Box<dyn Future<Output = Result<ExportStatus, ReportingError>> + Send + 'a>>;
}

/// Receives progress for non-terminal status reads when polling is verbose.
pub trait PollObserver: Send + Sync {
    fn on_progress(&self, attempt: u32, job: &ExportJob);
}

/// Reports progress as `info` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PollObserver for TracingObserver {
    fn on_progress(&self, attempt: u32, job: &ExportJob) {
        info!(
            job_id = job.job_id(),
            attempt,
            status = %job.status(),
            percent_complete = job.percent_complete(),
            "export in progress"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Submitted,
    Polling,
    Completed,
    Failed,
    TimedOut,
}

impl JobState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }
}

/// A job that reached `complete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedExport {
    pub job: ExportJob,
    /// Final status reply.
    pub status: ExportStatus,
    pub attempts: u32,
}

impl CompletedExport {
    /// Artifact URL from the final status reply.
    pub fn report_url(&self) -> Result<&str, ReportingError> {
        self.status.report_url()
    }
}

/// A job still pending when the budget ran out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedOutExport {
    pub job: ExportJob,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Terminal, non-error outcome of polling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollOutcome {
    Completed(CompletedExport),
    TimedOut(TimedOutExport),
}

impl PollOutcome {
    pub fn job(&self) -> &ExportJob {
        match self {
            Self::Completed(completed) => &completed.job,
            Self::TimedOut(timed_out) => &timed_out.job,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Completed(completed) => completed.attempts,
            Self::TimedOut(timed_out) => timed_out.attempts,
        }
    }
}

/// Drives one export job to a terminal state.
pub struct ExportJobPoller<'a> {
    source: &'a dyn StatusSource,
    job: ExportJob,
    config: PollConfig,
    observer: Arc<dyn PollObserver>,
    history: Vec<JobState>,
    attempts: u32,
    elapsed: Duration,
}

impl<'a> ExportJobPoller<'a> {
    pub fn new(source: &'a dyn StatusSource, job: ExportJob, config: PollConfig) -> Self {
        Self {
            source,
            job,
            config,
            observer: Arc::new(TracingObserver),
            history: vec![JobState::Submitted],
            attempts: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PollObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> JobState {
        self.history.last().copied().unwrap_or(JobState::Submitted)
    }

    /// Every state entered so far, starting with `Submitted`.
    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn job(&self) -> &ExportJob {
        &self.job
    }

    /// Polls until the job completes, fails, or the budget runs out.
    ///
    /// An unusable [`PollConfig`], a `fail` status and any protocol or
    /// transport error are returned as errors; running out of budget is
    /// [`PollOutcome::TimedOut`].
    pub async fn run(&mut self) -> Result<PollOutcome, ReportingError> {
        if self.state().is_terminal() {
            return Err(ReportingError::sdk(format!(
                "poller for job '{}' already finished in state {:?}",
                self.job.job_id(),
                self.state()
            )));
        }

        self.config.validate()?;

        loop {
            let status = self.source.status(&self.job).await?;
            self.attempts += 1;
            self.job.observe(&status);
            debug!(
                job_id = self.job.job_id(),
                attempt = self.attempts,
                status = %status.status,
                percent_complete = status.percent_complete,
                "export status read"
            );

            match status.status {
                JobStatus::Complete => {
                    self.history.push(JobState::Completed);
                    info!(
                        job_id = self.job.job_id(),
                        attempts = self.attempts,
                        "export completed"
                    );
                    return Ok(PollOutcome::Completed(CompletedExport {
                        job: self.job.clone(),
                        status,
                        attempts: self.attempts,
                    }));
                }
                JobStatus::Fail => {
                    self.history.push(JobState::Failed);
                    warn!(job_id = self.job.job_id(), "export failed");
                    return Err(ReportingError::service(
                        200,
                        format!("export job '{}' failed", self.job.job_id()),
                    ));
                }
                JobStatus::Queued | JobStatus::Running => {
                    self.history.push(JobState::Polling);
                }
            }

            if self.config.verbose {
                self.observer.on_progress(self.attempts, &self.job);
            }

            let delay = self.config.backoff.delay(self.attempts - 1);
            if !self.config.is_unbounded() {
                self.elapsed += delay;
                if self.elapsed >= self.config.timeout {
                    self.history.push(JobState::TimedOut);
                    warn!(
                        job_id = self.job.job_id(),
                        attempts = self.attempts,
                        elapsed_secs = self.elapsed.as_secs_f64(),
                        "export polling timed out"
                    );
                    return Ok(PollOutcome::TimedOut(TimedOutExport {
                        job: self.job.clone(),
                        attempts: self.attempts,
                        elapsed: self.elapsed,
                    }));
                }
            }

            tokio::time::sleep(delay).await;
        }
    }
}
