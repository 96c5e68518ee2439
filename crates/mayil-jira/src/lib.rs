//! Bridge between Jira and the Mayil processing service.
//!
//! This crate provides:
//! - Webhook decoding and event classification
//! - Issue submission with inlined image attachments
//! - Delayed status polling with a bounded retry budget
//! - Comment reconciliation (one Mayil comment per task, updated in place)
//! - Rerun handling for `@mayil-ai rerun` comments
//! - Markdown to Atlassian Document Format conversion
//! - HTTP server for webhook handling (standalone service)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Most operations are remote calls that can fail

pub mod adf;
pub mod classifier;
pub mod config;
pub mod error;
pub mod handlers;
mod http;
pub mod jira;
pub mod mayil;
pub mod models;
pub mod scheduler;
pub mod server;
pub mod webhooks;

#[cfg(test)]
mod testing;

pub use classifier::{classify, Intent};
pub use config::{Config, PollPolicy};
pub use error::{Error, Result};
pub use handlers::{Bridge, PollOutcome, Reconciled, StatusPoller, TaskSubmitter};
pub use jira::{IssueTracker, JiraClient};
pub use mayil::{MayilClient, ProcessingService};
pub use models::*;
pub use scheduler::{run_poll_worker, DelayQueue, Scheduler};
pub use webhooks::Event;
