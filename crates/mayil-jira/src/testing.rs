//! In-memory collaborators that record every call.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::adf::Document;
use crate::error::{CommentOperation, Error, Result};
use crate::jira::IssueTracker;
use crate::mayil::ProcessingService;
use crate::models::{IssueSnapshot, Task, TaskStatusResponse};
use crate::scheduler::Scheduler;

/// A call made against [`FakeTracker`].
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerCall {
    GetIssue(String),
    GetAttachment(String),
    Create {
        issue_id: String,
        body: Document,
    },
    Update {
        issue_id: String,
        comment_id: String,
        body: Document,
    },
    Delete {
        issue_id: String,
        comment_id: String,
    },
}

#[derive(Default)]
pub struct FakeTracker {
    pub issues: Mutex<HashMap<String, serde_json::Value>>,
    pub attachments: Mutex<HashMap<String, Vec<u8>>>,
    pub calls: Mutex<Vec<TrackerCall>>,
    /// Status returned by comment calls instead of success
    pub comment_failure: Mutex<Option<u16>>,
}

impl FakeTracker {
    pub fn with_issue(key: &str, fields: serde_json::Value) -> Arc<Self> {
        let tracker = Self::default();
        tracker
            .issues
            .lock()
            .unwrap()
            .insert(key.to_string(), json!({ "id": "10001", "key": key, "fields": fields }));
        Arc::new(tracker)
    }

    pub fn add_attachment(&self, id: &str, bytes: &[u8]) {
        self.attachments
            .lock()
            .unwrap()
            .insert(id.to_string(), bytes.to_vec());
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: TrackerCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn comment_result(&self, operation: CommentOperation, issue_id: &str) -> Result<()> {
        match *self.comment_failure.lock().unwrap() {
            Some(status) => Err(Error::CommentApi {
                operation,
                issue_id: issue_id.to_string(),
                status,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn get_issue(&self, issue_key: &str) -> Result<IssueSnapshot> {
        self.record(TrackerCall::GetIssue(issue_key.to_string()));
        let issue = self.issues.lock().unwrap().get(issue_key).cloned();
        match issue {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(Error::FetchStatus {
                what: format!("issue {issue_key}"),
                status: 404,
            }),
        }
    }

    async fn get_attachment_content(&self, attachment_id: &str) -> Result<Vec<u8>> {
        self.record(TrackerCall::GetAttachment(attachment_id.to_string()));
        self.attachments
            .lock()
            .unwrap()
            .get(attachment_id)
            .cloned()
            .ok_or_else(|| Error::FetchStatus {
                what: format!("attachment {attachment_id}"),
                status: 404,
            })
    }

    async fn create_comment(&self, issue_id: &str, body: &Document) -> Result<String> {
        self.record(TrackerCall::Create {
            issue_id: issue_id.to_string(),
            body: body.clone(),
        });
        self.comment_result(CommentOperation::Create, issue_id)?;
        let created = self
            .calls()
            .iter()
            .filter(|c| matches!(c, TrackerCall::Create { .. }))
            .count();
        Ok((10_000 + created).to_string())
    }

    async fn update_comment(
        &self,
        issue_id: &str,
        comment_id: &str,
        body: &Document,
    ) -> Result<()> {
        self.record(TrackerCall::Update {
            issue_id: issue_id.to_string(),
            comment_id: comment_id.to_string(),
            body: body.clone(),
        });
        self.comment_result(CommentOperation::Update, issue_id)
    }

    async fn delete_comment(&self, issue_id: &str, comment_id: &str) -> Result<()> {
        self.record(TrackerCall::Delete {
            issue_id: issue_id.to_string(),
            comment_id: comment_id.to_string(),
        });
        self.comment_result(CommentOperation::Delete, issue_id)
    }
}

#[derive(Default)]
pub struct FakeProcessor {
    pub task_ids: Mutex<VecDeque<String>>,
    pub statuses: Mutex<VecDeque<TaskStatusResponse>>,
    pub submitted: Mutex<Vec<IssueSnapshot>>,
    pub polled: Mutex<Vec<String>>,
    pub registered: Mutex<Vec<(String, String)>>,
    pub reject_submissions: Mutex<bool>,
}

impl FakeProcessor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_task_id(&self, task_id: &str) {
        self.task_ids.lock().unwrap().push_back(task_id.to_string());
    }

    pub fn push_status(&self, status: &str, result: Option<&str>, previous: Option<&str>) {
        self.statuses.lock().unwrap().push_back(TaskStatusResponse {
            status: status.to_string(),
            result: result.map(str::to_string),
            previous_comment_id: previous.map(str::to_string),
        });
    }

    pub fn submitted(&self) -> Vec<IssueSnapshot> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn registered(&self) -> Vec<(String, String)> {
        self.registered.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessingService for FakeProcessor {
    async fn submit(&self, issue: &IssueSnapshot) -> Result<String> {
        if *self.reject_submissions.lock().unwrap() {
            return Err(Error::RemoteService("create_event returned 500".to_string()));
        }
        self.submitted.lock().unwrap().push(issue.clone());
        Ok(self
            .task_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "task-1".to_string()))
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse> {
        self.polled.lock().unwrap().push(task_id.to_string());
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::FetchStatus {
                what: format!("Mayil results for task {task_id}"),
                status: 404,
            })
    }

    async fn register_comment(&self, task_id: &str, comment_id: &str) -> Result<()> {
        self.registered
            .lock()
            .unwrap()
            .push((task_id.to_string(), comment_id.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingScheduler {
    pub enqueued: Mutex<Vec<(Task, Duration)>>,
}

impl RecordingScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enqueued(&self) -> Vec<(Task, Duration)> {
        self.enqueued.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scheduler for RecordingScheduler {
    async fn enqueue(&self, task: Task, delay: Duration) -> Result<()> {
        self.enqueued.lock().unwrap().push((task, delay));
        Ok(())
    }
}
