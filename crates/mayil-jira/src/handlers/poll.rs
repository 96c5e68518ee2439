//! Status polling: the per-task state machine driven by delayed poll messages.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::adf::markdown_to_document;
use crate::config::PollPolicy;
use crate::error::{Error, Result};
use crate::handlers::reconcile::{CommentReconciler, Reconciled};
use crate::mayil::ProcessingService;
use crate::models::{RemoteStatus, Task};
use crate::scheduler::Scheduler;

/// Result of handling one poll message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollOutcome {
    /// The result was posted to the issue
    Completed { comment: Reconciled },
    /// Still pending; another poll was scheduled
    Rescheduled { attempt: u32 },
    /// Mayil reported failure; nothing was posted
    Failed,
    /// Still pending after the last allowed attempt; polling stopped
    Exhausted { attempt: u32, status: String },
}

/// Handles poll messages for in-flight tasks.
pub struct StatusPoller {
    processor: Arc<dyn ProcessingService>,
    scheduler: Arc<dyn Scheduler>,
    reconciler: CommentReconciler,
    interval: Duration,
    max_attempts: u32,
}

impl StatusPoller {
    #[must_use]
    pub fn new(
        processor: Arc<dyn ProcessingService>,
        scheduler: Arc<dyn Scheduler>,
        reconciler: CommentReconciler,
        policy: &PollPolicy,
    ) -> Self {
        Self {
            processor,
            scheduler,
            reconciler,
            interval: policy.interval,
            max_attempts: policy.max_attempts,
        }
    }

    /// Check a task once and act on its status.
    ///
    /// A completed task is reconciled regardless of its attempt count. A pending
    /// task is rescheduled while `attempt < max_attempts`. Nothing is rescheduled on
    /// error: the in-process worker logs it and the task ends, unless an external
    /// queue retries its delivery to `POST /events/poll`.
    #[instrument(
        skip(self, task),
        fields(task_id = %task.task_id, issue_id = %task.issue_id, attempt = task.attempt)
    )]
    pub async fn on_poll(&self, task: &Task) -> Result<PollOutcome> {
        info!("Checking task status");
        let status = self.processor.task_status(&task.task_id).await?;

        match status.remote_status() {
            RemoteStatus::Completed => {
                let result = status.result.as_deref().ok_or_else(|| {
                    Error::RemoteService(format!(
                        "task {} completed without a result",
                        task.task_id
                    ))
                })?;

                let previous = status
                    .previous_comment_id
                    .as_deref()
                    .or(task.previous_comment_id.as_deref());
                if let Some(previous) = previous {
                    info!(previous_comment_id = previous, "Previous comment found");
                }

                let body = markdown_to_document(result);
                let comment = self.reconciler.reconcile(task, previous, &body).await?;
                info!(comment_id = comment.comment_id(), "Task completed");

                Ok(PollOutcome::Completed { comment })
            }
            RemoteStatus::Failed => {
                warn!(status = %status.status, "Task failed in Mayil, no comment posted");
                Ok(PollOutcome::Failed)
            }
            RemoteStatus::Pending(raw) if task.attempt < self.max_attempts => {
                let next = task.next_attempt();
                let attempt = next.attempt;
                info!(
                    status = %raw,
                    next_attempt = attempt,
                    retry_in_secs = self.interval.as_secs(),
                    "Task not finished, retrying"
                );
                self.scheduler.enqueue(next, self.interval).await?;
                Ok(PollOutcome::Rescheduled { attempt })
            }
            RemoteStatus::Pending(raw) => {
                warn!(
                    status = %raw,
                    max_attempts = self.max_attempts,
                    "Maximum attempts reached, terminating retries"
                );
                Ok(PollOutcome::Exhausted {
                    attempt: task.attempt,
                    status: raw,
                })
            }
        }
    }
}
