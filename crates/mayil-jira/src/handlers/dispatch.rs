//! Routes classified webhook events to the lifecycle handlers.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::classifier::{classify, Intent};
use crate::error::Result;
use crate::handlers::rerun::RerunHandler;
use crate::handlers::submit::TaskSubmitter;
use crate::models::Task;
use crate::webhooks::Event;

/// What the dispatcher did with an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatched {
    pub intent: Intent,
    /// Task started for the event, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
}

/// Webhook entry point into the task lifecycle.
#[derive(Clone)]
pub struct WebhookDispatcher {
    submitter: TaskSubmitter,
    rerun: RerunHandler,
}

impl WebhookDispatcher {
    #[must_use]
    pub fn new(submitter: TaskSubmitter, rerun: RerunHandler) -> Self {
        Self { submitter, rerun }
    }

    #[instrument(skip(self, event), fields(issue_key = event.issue_key()))]
    pub async fn dispatch(&self, event: &Event) -> Result<Dispatched> {
        let intent = classify(event);
        debug!(?intent, "Classified webhook event");

        let task = match &intent {
            Intent::StartProcessing { issue_key } => {
                info!("Issue changed, submitting to Mayil");
                Some(self.submitter.submit(issue_key).await?)
            }
            Intent::Rerun {
                issue_key,
                comment_id,
            } => Some(self.rerun.on_rerun(issue_key, comment_id).await?),
            Intent::Ignore { reason } => {
                info!(reason, "Ignoring event");
                None
            }
        };

        Ok(Dispatched { intent, task })
    }
}
