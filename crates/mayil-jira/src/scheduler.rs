//! Delayed delivery of poll messages.
//!
//! The [`Scheduler`] trait is the only thing the task lifecycle knows about the queue:
//! a message handed to it must reach the status poller no earlier than the requested
//! delay, at least once. [`DelayQueue`] is the in-process implementation used by the
//! service binary; it is not durable across restarts, so deployments that need
//! durability point an external queue at `POST /events/poll` instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::handlers::StatusPoller;
use crate::models::Task;

/// Delayed, at-least-once delivery of poll messages.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Deliver `task` to the status poller after `delay`.
    async fn enqueue(&self, task: Task, delay: Duration) -> Result<()>;
}

/// Tokio-timer backed delay queue.
#[derive(Debug, Clone)]
pub struct DelayQueue {
    sender: mpsc::UnboundedSender<Task>,
}

impl DelayQueue {
    /// Create a queue and the receiver that due messages are delivered to.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Task>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Scheduler for DelayQueue {
    async fn enqueue(&self, task: Task, delay: Duration) -> Result<()> {
        if self.sender.is_closed() {
            return Err(Error::Scheduler("delay queue is closed".to_string()));
        }

        debug!(
            task_id = %task.task_id,
            attempt = task.attempt,
            delay_secs = delay.as_secs(),
            "Scheduling status poll"
        );

        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(returned) = sender.send(task) {
                warn!(
                    task_id = %returned.0.task_id,
                    "Delay queue closed before poll message was delivered"
                );
            }
        });
        Ok(())
    }
}

/// Consume due poll messages, running each one as an independent invocation.
///
/// Returns once every [`DelayQueue`] handle has been dropped.
pub async fn run_poll_worker(
    mut receiver: mpsc::UnboundedReceiver<Task>,
    poller: Arc<StatusPoller>,
) {
    info!("Poll worker started");

    while let Some(task) = receiver.recv().await {
        let poller = Arc::clone(&poller);
        tokio::spawn(async move {
            if let Err(e) = poller.on_poll(&task).await {
                error!(
                    task_id = %task.task_id,
                    issue_id = %task.issue_id,
                    attempt = task.attempt,
                    error = %e,
                    "Status poll failed"
                );
            }
        });
    }

    info!("Poll worker stopped");
}
