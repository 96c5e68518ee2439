//! Task, issue snapshot and Mayil wire types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Status string Mayil reports for a finished task.
pub const STATUS_COMPLETED: &str = "completed";

/// Status string Mayil reports for a task it gave up on.
pub const STATUS_FAILED: &str = "failed";

/// An in-flight Mayil job.
///
/// This is the poll message payload and the only state kept for a job: it travels
/// through the delayed queue and is never stored anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Mayil task identifier
    pub task_id: String,
    /// Jira issue key the result belongs to
    pub issue_id: String,
    /// Number of status polls already answered with a pending status
    #[serde(default)]
    pub attempt: u32,
    /// Comment to update in place instead of creating a new one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_comment_id: Option<String>,
}

impl Task {
    /// A freshly submitted task (attempt 0, no prior comment).
    #[must_use]
    pub fn new(task_id: impl Into<String>, issue_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            issue_id: issue_id.into(),
            attempt: 0,
            previous_comment_id: None,
        }
    }

    /// The same task with its attempt counter advanced by one.
    #[must_use]
    pub fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            ..self.clone()
        }
    }
}

/// Full Jira issue as submitted to Mayil.
///
/// Only the attachment list is interpreted; every other field is passed through
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSnapshot {
    /// Issue key (e.g., "ABC-1")
    pub key: String,
    /// Issue fields
    pub fields: IssueFields,
    /// Remaining top-level issue properties
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Issue fields with the attachment list split out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    /// Attachments on the issue
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attachment: Vec<Attachment>,
    /// Summary, description and all other fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Jira attachment metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment ID
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// MIME type reported by Jira
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    /// Content URL from Jira, replaced by base64 data for inlined images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Filename, size, author and other properties
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attachment {
    /// Whether this attachment is an image and should be inlined.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image")
    }
}

/// Response from `POST /jira/create_event`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Task created for the submission
    #[serde(deserialize_with = "string_or_number")]
    pub task_id: String,
}

/// Response from `GET /get-results/{task_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    /// `pending`, `completed`, `failed` or another in-progress status
    pub status: String,
    /// Markdown result, present once completed
    #[serde(default)]
    pub result: Option<String>,
    /// Comment registered for this task by an earlier completion
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub previous_comment_id: Option<String>,
}

/// Interpretation of a Mayil status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    /// Result is ready
    Completed,
    /// Mayil gave up on the task
    Failed,
    /// Still running; carries the raw status for logging
    Pending(String),
}

impl TaskStatusResponse {
    /// Classify the raw status string.
    #[must_use]
    pub fn remote_status(&self) -> RemoteStatus {
        match self.status.as_str() {
            STATUS_COMPLETED => RemoteStatus::Completed,
            STATUS_FAILED => RemoteStatus::Failed,
            other => RemoteStatus::Pending(other.to_string()),
        }
    }
}

/// Body for `POST /jira/post_comment`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterCommentRequest<'a> {
    /// Task the comment was created for
    pub task_id: &'a str,
    /// Jira comment ID
    pub comment_id: &'a str,
}

/// Jira comment as returned by the create endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedComment {
    /// Comment ID
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(RawId::into_string)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(RawId::into_string))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
