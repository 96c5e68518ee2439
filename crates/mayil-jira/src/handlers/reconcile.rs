//! Keeps one Mayil comment per task on the Jira issue.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::adf::Document;
use crate::error::Result;
use crate::jira::IssueTracker;
use crate::mayil::ProcessingService;
use crate::models::Task;

/// What reconciliation did to the issue's comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Reconciled {
    /// A new comment was posted and registered with Mayil
    Created { comment_id: String },
    /// The previously registered comment was edited in place
    Updated { comment_id: String },
}

impl Reconciled {
    #[must_use]
    pub fn comment_id(&self) -> &str {
        match self {
            Self::Created { comment_id } | Self::Updated { comment_id } => comment_id,
        }
    }
}

/// Comment operations against the tracker, plus registration of new comments.
#[derive(Clone)]
pub struct CommentReconciler {
    tracker: Arc<dyn IssueTracker>,
    processor: Arc<dyn ProcessingService>,
}

impl CommentReconciler {
    #[must_use]
    pub fn new(tracker: Arc<dyn IssueTracker>, processor: Arc<dyn ProcessingService>) -> Self {
        Self { tracker, processor }
    }

    /// Post `body` for a completed task.
    ///
    /// With a `previous_comment_id` the existing comment is updated and nothing is
    /// registered. Otherwise a new comment is created and its ID reported to Mayil,
    /// so the next completion for the same task finds it.
    ///
    /// Not idempotent: two deliveries of the same completion that both run before
    /// either registration lands will each create a comment.
    #[instrument(skip(self, task, body), fields(task_id = %task.task_id, issue_id = %task.issue_id))]
    pub async fn reconcile(
        &self,
        task: &Task,
        previous_comment_id: Option<&str>,
        body: &Document,
    ) -> Result<Reconciled> {
        if let Some(comment_id) = previous_comment_id {
            self.update_comment(&task.issue_id, comment_id, body).await?;
            info!(comment_id, "Updated existing comment");
            return Ok(Reconciled::Updated {
                comment_id: comment_id.to_string(),
            });
        }

        let comment_id = self.create_comment(&task.issue_id, body).await?;
        self.processor
            .register_comment(&task.task_id, &comment_id)
            .await?;
        info!(comment_id = %comment_id, "Comment added");

        Ok(Reconciled::Created { comment_id })
    }

    pub async fn create_comment(&self, issue_id: &str, body: &Document) -> Result<String> {
        self.tracker.create_comment(issue_id, body).await
    }

    pub async fn update_comment(
        &self,
        issue_id: &str,
        comment_id: &str,
        body: &Document,
    ) -> Result<()> {
        self.tracker.update_comment(issue_id, comment_id, body).await
    }

    pub async fn delete_comment(&self, issue_id: &str, comment_id: &str) -> Result<()> {
        self.tracker.delete_comment(issue_id, comment_id).await?;
        info!(issue_id, comment_id, "Comment deleted");
        Ok(())
    }
}
