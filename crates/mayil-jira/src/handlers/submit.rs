//! Issue submission: snapshot the issue, start a Mayil task, schedule the first poll.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::jira::IssueTracker;
use crate::mayil::ProcessingService;
use crate::models::{Attachment, IssueSnapshot, Task};
use crate::scheduler::Scheduler;

/// Submits issues to Mayil and queues the first status poll.
#[derive(Clone)]
pub struct TaskSubmitter {
    tracker: Arc<dyn IssueTracker>,
    processor: Arc<dyn ProcessingService>,
    scheduler: Arc<dyn Scheduler>,
    initial_delay: Duration,
}

impl TaskSubmitter {
    /// Create a submitter that waits `initial_delay` before the first poll.
    #[must_use]
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        processor: Arc<dyn ProcessingService>,
        scheduler: Arc<dyn Scheduler>,
        initial_delay: Duration,
    ) -> Self {
        Self {
            tracker,
            processor,
            scheduler,
            initial_delay,
        }
    }

    /// Submit an issue and return the task that was scheduled for polling.
    #[instrument(skip(self))]
    pub async fn submit(&self, issue_key: &str) -> Result<Task> {
        let snapshot = self.snapshot(issue_key).await?;

        info!(
            images = snapshot.fields.attachment.len(),
            "Sending request to Mayil"
        );
        let task_id = self.processor.submit(&snapshot).await?;
        let task = Task::new(task_id, issue_key);

        info!(
            task_id = %task.task_id,
            delay_secs = self.initial_delay.as_secs(),
            "Adding task to poll queue"
        );
        self.scheduler
            .enqueue(task.clone(), self.initial_delay)
            .await?;

        Ok(task)
    }

    /// Fetch the current issue and inline its image attachments as base64.
    ///
    /// Webhook payloads omit the description, so the issue is always re-read.
    /// Non-image attachments are dropped from the snapshot.
    pub async fn snapshot(&self, issue_key: &str) -> Result<IssueSnapshot> {
        let mut issue = self.tracker.get_issue(issue_key).await?;

        let attachments = std::mem::take(&mut issue.fields.attachment);
        let total = attachments.len();

        let mut images = Vec::new();
        for mut attachment in attachments.into_iter().filter(Attachment::is_image) {
            let bytes = self.tracker.get_attachment_content(&attachment.id).await?;
            attachment.content = Some(STANDARD.encode(bytes));
            images.push(attachment);
        }

        debug!(total, images = images.len(), "Inlined image attachments");
        issue.fields.attachment = images;
        Ok(issue)
    }
}
