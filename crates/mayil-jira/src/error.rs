//! Error types for the Mayil Jira bridge.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that end a single webhook or poll invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure talking to Jira or Mayil
    #[error("failed to fetch {what}: {source}")]
    Fetch {
        /// What was being fetched
        what: String,
        /// Underlying HTTP error
        #[source]
        source: reqwest::Error,
    },

    /// Jira or Mayil answered with a non-success status
    #[error("{what} returned unexpected status {status}")]
    FetchStatus {
        /// What was being fetched
        what: String,
        /// HTTP status code
        status: u16,
    },

    /// Mayil rejected a submission or returned an unusable body
    #[error("processing service error: {0}")]
    RemoteService(String),

    /// A comment create/update/delete did not return its expected status
    #[error("unable to {operation} comment on issue {issue_id}: status {status}")]
    CommentApi {
        /// Which comment call failed
        operation: CommentOperation,
        /// Issue id or key the comment belongs to
        issue_id: String,
        /// HTTP status code returned by Jira
        status: u16,
    },

    /// Inbound webhook event had an unexpected shape
    #[error("malformed webhook event: {0}")]
    MalformedEvent(String),

    /// The delayed queue refused a poll message
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// An ID that cannot be used as a URL path segment
    #[error("invalid path segment {0:?}")]
    InvalidPathSegment(String),

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Comment calls made against the issue tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOperation {
    /// `POST /issue/{key}/comment`
    Create,
    /// `PUT /issue/{key}/comment/{id}`
    Update,
    /// `DELETE /issue/{key}/comment/{id}`
    Delete,
}

impl CommentOperation {
    /// Status code Jira returns when the call succeeds.
    #[must_use]
    pub const fn expected_status(self) -> u16 {
        match self {
            Self::Create => 201,
            Self::Update => 200,
            Self::Delete => 204,
        }
    }
}

impl fmt::Display for CommentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}
