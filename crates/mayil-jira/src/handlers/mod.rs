//! Task lifecycle handlers.
//!
//! Webhook events enter through [`WebhookDispatcher`], issues are submitted by
//! [`TaskSubmitter`], and delayed poll messages are handled by [`StatusPoller`],
//! which posts results through [`CommentReconciler`].

pub mod dispatch;
pub mod poll;
pub mod reconcile;
pub mod rerun;
pub mod submit;

use std::sync::Arc;

pub use dispatch::{Dispatched, WebhookDispatcher};
pub use poll::{PollOutcome, StatusPoller};
pub use reconcile::{CommentReconciler, Reconciled};
pub use rerun::RerunHandler;
pub use submit::TaskSubmitter;

use crate::config::PollPolicy;
use crate::jira::IssueTracker;
use crate::mayil::ProcessingService;
use crate::scheduler::Scheduler;

/// All lifecycle handlers wired to one set of collaborators.
#[derive(Clone)]
pub struct Bridge {
    pub dispatcher: WebhookDispatcher,
    pub submitter: TaskSubmitter,
    pub poller: Arc<StatusPoller>,
}

impl Bridge {
    #[must_use]
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        processor: Arc<dyn ProcessingService>,
        scheduler: Arc<dyn Scheduler>,
        policy: &PollPolicy,
    ) -> Self {
        let reconciler = CommentReconciler::new(Arc::clone(&tracker), Arc::clone(&processor));
        let submitter = TaskSubmitter::new(
            tracker,
            Arc::clone(&processor),
            Arc::clone(&scheduler),
            policy.initial_delay,
        );
        let rerun = RerunHandler::new(reconciler.clone(), submitter.clone());
        let poller = StatusPoller::new(processor, scheduler, reconciler, policy);

        Self {
            dispatcher: WebhookDispatcher::new(submitter.clone(), rerun),
            submitter,
            poller: Arc::new(poller),
        }
    }
}
