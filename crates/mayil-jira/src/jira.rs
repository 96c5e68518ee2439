//! Jira Cloud REST client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde_json::json;
use tracing::{debug, instrument};

use crate::adf::Document;
use crate::error::{CommentOperation, Error, Result};
use crate::http::{endpoint, ensure_success, parse_base_url};
use crate::models::{CreatedComment, IssueSnapshot};

/// Issue-tracker operations the bridge depends on.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch the full issue, including description and attachment metadata.
    async fn get_issue(&self, issue_key: &str) -> Result<IssueSnapshot>;

    /// Download the raw bytes of an attachment.
    async fn get_attachment_content(&self, attachment_id: &str) -> Result<Vec<u8>>;

    /// Add a comment and return its ID. Expects `201 Created`.
    async fn create_comment(&self, issue_id: &str, body: &Document) -> Result<String>;

    /// Replace a comment body. Expects `200 OK`.
    async fn update_comment(&self, issue_id: &str, comment_id: &str, body: &Document)
        -> Result<()>;

    /// Delete a comment. Expects `204 No Content`.
    async fn delete_comment(&self, issue_id: &str, comment_id: &str) -> Result<()>;
}

/// Jira REST API v3 client
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl JiraClient {
    /// Create a client for a Jira site.
    ///
    /// Requests are sent with basic auth when both `email` and `api_token` are given.
    pub fn new(base_url: &str, email: Option<&str>, api_token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        let credentials = match (email, api_token) {
            (Some(email), Some(token)) => Some((email.to_string(), token.to_string())),
            _ => None,
        };

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            credentials,
        })
    }

    /// Build a REST v3 request; each of `segments` becomes one encoded path segment.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let mut path = vec!["rest", "api", "3"];
        path.extend_from_slice(segments);
        let request = self
            .client
            .request(method, endpoint(&self.base_url, &path)?);
        Ok(match &self.credentials {
            Some((email, token)) => request.basic_auth(email, Some(token)),
            None => request,
        })
    }

    async fn send(request: RequestBuilder, what: &str) -> Result<Response> {
        request.send().await.map_err(|source| Error::Fetch {
            what: what.to_string(),
            source,
        })
    }

    async fn send_comment(
        request: RequestBuilder,
        operation: CommentOperation,
        issue_id: &str,
    ) -> Result<Response> {
        let response = Self::send(request, &format!("comment {operation} on {issue_id}")).await?;
        let status = response.status().as_u16();
        if status != operation.expected_status() {
            return Err(Error::CommentApi {
                operation,
                issue_id: issue_id.to_string(),
                status,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    #[instrument(skip(self))]
    async fn get_issue(&self, issue_key: &str) -> Result<IssueSnapshot> {
        let what = format!("issue {issue_key}");
        let response = Self::send(self.request(Method::GET, &["issue", issue_key])?, &what)
            .await?;
        let issue: IssueSnapshot = ensure_success(response, &what)?
            .json()
            .await
            .map_err(|source| Error::Fetch { what, source })?;

        debug!(
            issue_key = %issue.key,
            attachments = issue.fields.attachment.len(),
            "Retrieved issue"
        );
        Ok(issue)
    }

    #[instrument(skip(self))]
    async fn get_attachment_content(&self, attachment_id: &str) -> Result<Vec<u8>> {
        let what = format!("attachment {attachment_id}");
        let response = Self::send(
            self.request(Method::GET, &["attachment", "content", attachment_id])?,
            &what,
        )
        .await?;
        let bytes = ensure_success(response, &what)?
            .bytes()
            .await
            .map_err(|source| Error::Fetch { what, source })?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, body))]
    async fn create_comment(&self, issue_id: &str, body: &Document) -> Result<String> {
        let request = self
            .request(Method::POST, &["issue", issue_id, "comment"])?
            .json(&json!({ "body": body }));
        let response = Self::send_comment(request, CommentOperation::Create, issue_id).await?;
        let comment: CreatedComment = response.json().await.map_err(|source| Error::Fetch {
            what: format!("created comment on {issue_id}"),
            source,
        })?;

        debug!(comment_id = %comment.id, "Comment created");
        Ok(comment.id)
    }

    #[instrument(skip(self, body))]
    async fn update_comment(
        &self,
        issue_id: &str,
        comment_id: &str,
        body: &Document,
    ) -> Result<()> {
        let request = self
            .request(Method::PUT, &["issue", issue_id, "comment", comment_id])?
            .json(&json!({ "body": body }));
        Self::send_comment(request, CommentOperation::Update, issue_id).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_comment(&self, issue_id: &str, comment_id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["issue", issue_id, "comment", comment_id])?;
        Self::send_comment(request, CommentOperation::Delete, issue_id).await?;
        Ok(())
    }
}
