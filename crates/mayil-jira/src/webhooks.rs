//! Jira webhook payload parsing.
//!
//! Payloads are decoded once, at the HTTP boundary, into the closed [`Event`] enum.
//! Anything that does not fit is rejected with [`Error::MalformedEvent`].

use serde::Deserialize;

use crate::adf::Node;
use crate::error::{Error, Result};
use crate::models::string_or_number;

/// Event type sent when an issue is created.
pub const EVENT_ISSUE_CREATED: &str = "avi:jira:created:issue";

/// Event type sent when issue fields change.
pub const EVENT_ISSUE_UPDATED: &str = "avi:jira:updated:issue";

/// Event type sent when a comment is added to an issue.
pub const EVENT_ISSUE_COMMENTED: &str = "avi:jira:commented:issue";

/// Raw webhook payload as delivered by Jira.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Event type (e.g., `avi:jira:created:issue`)
    pub event_type: String,
    /// Issue the event is about
    pub issue: IssueRef,
    /// Changed fields (update events)
    #[serde(default)]
    pub changelog: Option<Changelog>,
    /// New comment (comment events)
    #[serde(default)]
    pub comment: Option<WebhookComment>,
}

/// Issue reference in a webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueRef {
    /// Issue key (e.g., "ABC-1")
    pub key: String,
}

/// Changelog attached to update events.
#[derive(Debug, Clone, Deserialize)]
pub struct Changelog {
    /// Individual field changes
    #[serde(default)]
    pub items: Vec<ChangelogItem>,
}

/// A single changed field.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangelogItem {
    /// Field name as reported by Jira (e.g., "summary", "Attachment")
    pub field: String,
}

/// Comment attached to comment events.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookComment {
    /// Comment ID
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Comment body in ADF
    pub body: CommentBody,
}

/// ADF comment body; only the node tree is read.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentBody {
    /// Paragraph nodes
    #[serde(default)]
    pub content: Vec<Node>,
}

/// A decoded webhook event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Issue created
    Created {
        /// Issue key
        issue_key: String,
    },
    /// Issue fields changed
    Updated {
        /// Issue key
        issue_key: String,
        /// Names of the changed fields
        changed_fields: Vec<String>,
    },
    /// Comment added
    Commented {
        /// Issue key
        issue_key: String,
        /// New comment ID
        comment_id: String,
        /// Comment body nodes
        body: Vec<Node>,
    },
    /// Any other event type
    Other {
        /// Raw event type
        event_type: String,
        /// Issue key
        issue_key: String,
    },
}

impl Event {
    /// Decode a raw webhook body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| Error::MalformedEvent(format!("invalid payload: {e}")))?;
        Self::try_from(payload)
    }

    /// Issue key the event refers to.
    #[must_use]
    pub fn issue_key(&self) -> &str {
        match self {
            Self::Created { issue_key }
            | Self::Updated { issue_key, .. }
            | Self::Commented { issue_key, .. }
            | Self::Other { issue_key, .. } => issue_key,
        }
    }
}

impl TryFrom<WebhookPayload> for Event {
    type Error = Error;

    fn try_from(payload: WebhookPayload) -> Result<Self> {
        let issue_key = payload.issue.key;
        match payload.event_type.as_str() {
            EVENT_ISSUE_CREATED => Ok(Self::Created { issue_key }),
            EVENT_ISSUE_UPDATED => {
                let changelog = payload.changelog.ok_or_else(|| {
                    Error::MalformedEvent(format!("update event for {issue_key} has no changelog"))
                })?;
                Ok(Self::Updated {
                    issue_key,
                    changed_fields: changelog.items.into_iter().map(|i| i.field).collect(),
                })
            }
            EVENT_ISSUE_COMMENTED => {
                let comment = payload.comment.ok_or_else(|| {
                    Error::MalformedEvent(format!("comment event for {issue_key} has no comment"))
                })?;
                Ok(Self::Commented {
                    issue_key,
                    comment_id: comment.id,
                    body: comment.body.content,
                })
            }
            _ => Ok(Self::Other {
                event_type: payload.event_type,
                issue_key,
            }),
        }
    }
}
