//! Client for the Mayil processing service.

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::http::{endpoint, ensure_success, parse_base_url};
use crate::models::{IssueSnapshot, RegisterCommentRequest, SubmitResponse, TaskStatusResponse};

/// Processing-service operations the bridge depends on.
#[async_trait]
pub trait ProcessingService: Send + Sync {
    /// Start a job for an issue snapshot and return its task ID.
    async fn submit(&self, issue: &IssueSnapshot) -> Result<String>;

    /// Current status of a task.
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse>;

    /// Record the comment created for a task so later completions update it in place.
    async fn register_comment(&self, task_id: &str, comment_id: &str) -> Result<()>;
}

/// HTTP client for Mayil
#[derive(Debug, Clone)]
pub struct MayilClient {
    client: reqwest::Client,
    base_url: Url,
}

impl MayilClient {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: parse_base_url(base_url)?,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.base_url, segments)
    }
}

fn fetch_error(what: &str) -> impl FnOnce(reqwest::Error) -> Error + '_ {
    move |source| Error::Fetch {
        what: what.to_string(),
        source,
    }
}

#[async_trait]
impl ProcessingService for MayilClient {
    #[instrument(skip(self, issue), fields(issue_key = %issue.key))]
    async fn submit(&self, issue: &IssueSnapshot) -> Result<String> {
        const WHAT: &str = "Mayil create_event";

        let response = self
            .client
            .post(self.url(&["jira", "create_event"])?)
            .json(issue)
            .send()
            .await
            .map_err(fetch_error(WHAT))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteService(format!(
                "create_event returned {status}: {body}"
            )));
        }

        let submitted: SubmitResponse = response.json().await.map_err(|e| {
            Error::RemoteService(format!("create_event returned an unreadable body: {e}"))
        })?;

        debug!(task_id = %submitted.task_id, "Submitted issue to Mayil");
        Ok(submitted.task_id)
    }

    #[instrument(skip(self))]
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse> {
        let what = format!("Mayil results for task {task_id}");

        let response = self
            .client
            .get(self.url(&["get-results", task_id])?)
            .send()
            .await
            .map_err(fetch_error(&what))?;

        ensure_success(response, &what)?
            .json()
            .await
            .map_err(fetch_error(&what))
    }

    #[instrument(skip(self))]
    async fn register_comment(&self, task_id: &str, comment_id: &str) -> Result<()> {
        const WHAT: &str = "Mayil post_comment";

        let response = self
            .client
            .post(self.url(&["jira", "post_comment"])?)
            .json(&RegisterCommentRequest {
                task_id,
                comment_id,
            })
            .send()
            .await
            .map_err(fetch_error(WHAT))?;

        ensure_success(response, WHAT)?;
        Ok(())
    }
}
