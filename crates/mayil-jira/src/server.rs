//! HTTP server for Jira webhooks and poll messages.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::classifier::Intent;
use crate::handlers::{Bridge, Dispatched, PollOutcome};
use crate::models::Task;
use crate::webhooks::Event;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle handlers.
    pub bridge: Bridge,
}

/// Build the HTTP router for the bridge service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/jira", post(jira_webhook_handler))
        // Delivery target for external delayed queues
        .route("/events/poll", post(poll_handler))
        .route("/trigger/submit", post(trigger_submit))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request body for manual submission.
#[derive(Debug, Deserialize)]
pub struct TriggerSubmitRequest {
    /// Issue key (e.g., "ABC-1")
    pub issue_key: String,
}

/// Handle incoming Jira webhooks.
///
/// Malformed payloads are rejected with 400. Failures while acting on a valid
/// event return 500 so Jira redelivers it.
pub async fn jira_webhook_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    let event = Event::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Rejecting malformed webhook");
        StatusCode::BAD_REQUEST
    })?;

    info!(issue_key = event.issue_key(), "Received Jira webhook");

    let dispatched = state.bridge.dispatcher.dispatch(&event).await.map_err(|e| {
        error!(issue_key = event.issue_key(), error = %e, "Failed to handle webhook");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(webhook_response(&dispatched)))
}

fn webhook_response(dispatched: &Dispatched) -> Value {
    let task_id = dispatched.task.as_ref().map(|t| t.task_id.as_str());
    match &dispatched.intent {
        Intent::StartProcessing { issue_key } => json!({
            "status": "accepted",
            "intent": "start_processing",
            "issue_key": issue_key,
            "task_id": task_id
        }),
        Intent::Rerun {
            issue_key,
            comment_id,
        } => json!({
            "status": "accepted",
            "intent": "rerun",
            "issue_key": issue_key,
            "comment_id": comment_id,
            "task_id": task_id
        }),
        Intent::Ignore { reason } => json!({
            "status": "ignored",
            "intent": "ignore",
            "reason": reason
        }),
    }
}

/// Run one status poll for a delivered poll message.
async fn poll_handler(
    State(state): State<AppState>,
    Json(task): Json<Task>,
) -> Result<Json<PollOutcome>, StatusCode> {
    match state.bridge.poller.on_poll(&task).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            error!(task_id = %task.task_id, error = %e, "Status poll failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Manually submit an issue without waiting for a webhook.
async fn trigger_submit(
    State(state): State<AppState>,
    Json(request): Json<TriggerSubmitRequest>,
) -> Json<Value> {
    info!(issue_key = %request.issue_key, "Manual submission requested");

    match state.bridge.submitter.submit(&request.issue_key).await {
        Ok(task) => Json(json!({
            "status": "accepted",
            "task_id": task.task_id,
            "issue_key": task.issue_id
        })),
        Err(e) => {
            error!(error = %e, "Manual submission failed");
            Json(json!({
                "status": "error",
                "error": format!("Failed to submit issue: {e}")
            }))
        }
    }
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Readiness check endpoint.
async fn readiness_check() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}
