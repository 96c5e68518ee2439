//! Rerun requests made through an issue comment.

use tracing::{info, instrument};

use crate::error::Result;
use crate::handlers::reconcile::CommentReconciler;
use crate::handlers::submit::TaskSubmitter;
use crate::models::Task;

/// Removes the trigger comment and submits the issue again.
#[derive(Clone)]
pub struct RerunHandler {
    reconciler: CommentReconciler,
    submitter: TaskSubmitter,
}

impl RerunHandler {
    #[must_use]
    pub fn new(reconciler: CommentReconciler, submitter: TaskSubmitter) -> Self {
        Self {
            reconciler,
            submitter,
        }
    }

    /// The new task starts without a previous comment, so its result is posted
    /// as a fresh comment.
    #[instrument(skip(self))]
    pub async fn on_rerun(&self, issue_key: &str, comment_id: &str) -> Result<Task> {
        info!("Rerun requested");
        self.reconciler.delete_comment(issue_key, comment_id).await?;
        self.submitter.submit(issue_key).await
    }
}
