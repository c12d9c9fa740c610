//! Post-upload extraction of structured profile fields from a resume.
//!
//! [`ExtractionSource`] is the seam: `start` hands back an [`ExtractionHandle`]
//! that yields status snapshots until the job finishes or is cancelled.
//! [`SimulatedExtraction`] drives progress from elapsed time; a backend that
//! exposes a real job id can implement the same trait by polling it.

use std::time::Duration;

use futures::Stream;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::api::UploadReceipt;

/// Summary attached when the simulated extraction completes.
pub const DEFAULT_SUMMARY: &str = "Complete! Found 6 items";

/// One observation of an extraction job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStatus {
    pub in_progress: bool,
    pub progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<String>,
}

impl ExtractionStatus {
    pub fn started() -> Self {
        Self {
            in_progress: true,
            progress_percent: 0,
            result_summary: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.in_progress && self.progress_percent == 100
    }
}

/// Starts extraction jobs for uploaded resumes.
pub trait ExtractionSource: Send + Sync {
    fn start(&self, upload: &UploadReceipt) -> ExtractionHandle;
}

/// A running (or finished) extraction job. Dropping the handle cancels it.
#[derive(Debug)]
pub struct ExtractionHandle {
    job_id: String,
    status: watch::Receiver<ExtractionStatus>,
    task: Option<JoinHandle<()>>,
}

impl ExtractionHandle {
    pub fn new(
        job_id: impl Into<String>,
        status: watch::Receiver<ExtractionStatus>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            task: Some(task),
        }
    }

    /// The upload this job belongs to.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Latest snapshot.
    pub fn status(&self) -> ExtractionStatus {
        self.status.borrow().clone()
    }

    /// Snapshots from now on: the current one first, then every change,
    /// ending after the first finished snapshot or on cancellation.
    pub fn updates(&self) -> impl Stream<Item = ExtractionStatus> + Send + 'static {
        let rx = self.status.clone();
        futures::stream::unfold(Some((rx, true)), |state| async move {
            let (mut rx, first) = state?;
            if !first {
                rx.changed().await.ok()?;
            }
            let status = rx.borrow_and_update().clone();
            let next = status.in_progress.then_some((rx, false));
            Some((status, next))
        })
    }

    /// Waits until the job stops running, returning the final snapshot.
    /// A cancelled job returns whatever it last reported.
    pub async fn finished(&mut self) -> ExtractionStatus {
        let result = self
            .status
            .wait_for(|s| !s.in_progress)
            .await
            .map(|s| s.clone());
        result.unwrap_or_else(|_| self.status.borrow().clone())
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(job_id = %self.job_id, "extraction cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for ExtractionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Time-driven stand-in for a server-side extraction job.
#[derive(Debug, Clone)]
pub struct SimulatedExtraction {
    duration: Duration,
    poll_interval: Duration,
    summary: String,
}

impl SimulatedExtraction {
    pub fn new(duration: Duration, poll_interval: Duration) -> Self {
        Self {
            duration,
            poll_interval,
            summary: DEFAULT_SUMMARY.to_string(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }
}

impl ExtractionSource for SimulatedExtraction {
    fn start(&self, upload: &UploadReceipt) -> ExtractionHandle {
        let (tx, rx) = watch::channel(ExtractionStatus::started());
        let duration = self.duration;
        let poll_interval = self.poll_interval;
        let summary = self.summary.clone();
        let job_id = upload.public_id.clone();

        info!(job_id = %job_id, "extraction started");
        let task_job_id = job_id.clone();
        let task = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                let pct = progress_at(started.elapsed(), duration);
                let done = pct >= 100;
                tx.send_modify(|status| {
                    status.progress_percent = status.progress_percent.max(pct);
                    if done {
                        status.in_progress = false;
                        status.result_summary = Some(summary.clone());
                    }
                });
                if done {
                    info!(job_id = %task_job_id, "extraction complete");
                    break;
                }
                if tx.is_closed() {
                    break;
                }
            }
        });

        ExtractionHandle::new(job_id, rx, task)
    }
}

/// Percentage of `total` covered by `elapsed`, saturating at 100.
fn progress_at(elapsed: Duration, total: Duration) -> u8 {
    if total.is_zero() {
        return 100;
    }
    let pct = elapsed.as_millis().saturating_mul(100) / total.as_millis();
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    fn receipt() -> UploadReceipt {
        UploadReceipt {
            url: "https://cdn.example/resume.pdf".into(),
            public_id: "resumes/r1".into(),
        }
    }

    fn simulator() -> SimulatedExtraction {
        SimulatedExtraction::new(Duration::from_millis(3000), Duration::from_millis(100))
    }

    #[test]
    fn progress_at_saturates() {
        let total = Duration::from_millis(3000);
        assert_eq!(progress_at(Duration::ZERO, total), 0);
        assert_eq!(progress_at(Duration::from_millis(1500), total), 50);
        assert_eq!(progress_at(Duration::from_millis(9000), total), 100);
        assert_eq!(progress_at(Duration::from_millis(1), Duration::ZERO), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_completion_with_summary() {
        let mut handle = simulator().start(&receipt());
        assert_eq!(handle.job_id(), "resumes/r1");
        assert!(handle.status().in_progress);

        let done = handle.finished().await;
        assert!(done.is_complete());
        assert_eq!(done.progress_percent, 100);
        assert_eq!(done.result_summary.as_deref(), Some(DEFAULT_SUMMARY));
    }

    #[tokio::test(start_paused = true)]
    async fn updates_are_monotonic_and_end_at_100() {
        let handle = simulator().with_summary("Found 3 items").start(&receipt());
        let updates: Vec<ExtractionStatus> = handle.updates().collect().await;

        assert!(updates.len() > 2);
        for pair in updates.windows(2) {
            assert!(pair[0].progress_percent <= pair[1].progress_percent);
        }
        for status in &updates {
            if !status.in_progress {
                assert_eq!(status.progress_percent, 100);
            }
        }
        let last = updates.last().unwrap();
        assert!(!last.in_progress);
        assert_eq!(last.result_summary.as_deref(), Some("Found 3 items"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_progress() {
        let mut handle = simulator().start(&receipt());
        tokio::time::sleep(Duration::from_millis(450)).await;
        handle.cancel();
        assert!(handle.is_cancelled());

        let frozen = handle.finished().await;
        assert!(frozen.in_progress);
        assert!(frozen.progress_percent < 100);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.status(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_aborts_task() {
        let handle = simulator().start(&receipt());
        let mut rx = handle.status.clone();
        drop(handle);

        // The sender goes away with the aborted task.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.changed().await.is_err());
    }
}
