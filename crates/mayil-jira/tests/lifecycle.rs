//! End-to-end task lifecycle against mock Jira and Mayil servers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use mayil_jira::{
    Bridge, Event, JiraClient, MayilClient, PollOutcome, PollPolicy, Reconciled, Result,
    Scheduler, Task,
};

#[derive(Default)]
struct QueueSpy {
    enqueued: Mutex<Vec<(Task, Duration)>>,
}

impl QueueSpy {
    fn take(&self) -> Vec<(Task, Duration)> {
        std::mem::take(&mut *self.enqueued.lock().unwrap())
    }
}

#[async_trait]
impl Scheduler for QueueSpy {
    async fn enqueue(&self, task: Task, delay: Duration) -> Result<()> {
        self.enqueued.lock().unwrap().push((task, delay));
        Ok(())
    }
}

struct Services {
    jira: MockServer,
    mayil: MockServer,
    queue: Arc<QueueSpy>,
    bridge: Bridge,
}

async fn services() -> Services {
    let jira = MockServer::start().await;
    let mayil = MockServer::start().await;
    let queue = Arc::new(QueueSpy::default());

    let tracker = JiraClient::new(&jira.uri(), Some("bot@example.com"), Some("token")).unwrap();
    let bridge = Bridge::new(
        Arc::new(tracker),
        Arc::new(MayilClient::new(&mayil.uri()).unwrap()),
        queue.clone(),
        &PollPolicy::default(),
    );

    Services {
        jira,
        mayil,
        queue,
        bridge,
    }
}

async fn mount_issue(jira: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/api/3/issue/ABC-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "10001",
            "key": "ABC-1",
            "fields": {
                "summary": "Checkout button does nothing",
                "attachment": [
                    { "id": 900, "filename": "screen.png", "mimeType": "image/png",
                      "content": "https://x.atlassian.net/secure/attachment/900" },
                    { "id": 901, "filename": "log.txt", "mimeType": "text/plain",
                      "content": "https://x.atlassian.net/secure/attachment/901" }
                ]
            }
        })))
        .mount(jira)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/attachment/content/900"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
        .expect(1)
        .mount(jira)
        .await;
}

fn webhook(body: &Value) -> Event {
    Event::from_slice(body.to_string().as_bytes()).unwrap()
}

fn bold_done() -> Value {
    json!({
        "body": {
            "type": "doc",
            "version": 1,
            "content": [{
                "type": "paragraph",
                "content": [{ "type": "text", "text": "done", "marks": [{ "type": "strong" }] }]
            }]
        }
    })
}

fn submitted_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap()
}

#[tokio::test]
async fn test_created_issue_is_polled_and_commented() {
    let s = services().await;
    mount_issue(&s.jira).await;

    Mock::given(method("POST"))
        .and(path("/jira/create_event"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "t1" })))
        .expect(1)
        .mount(&s.mayil)
        .await;

    let dispatched = s
        .bridge
        .dispatcher
        .dispatch(&webhook(&json!({
            "eventType": "avi:jira:created:issue",
            "issue": { "key": "ABC-1" }
        })))
        .await
        .unwrap();
    assert_eq!(dispatched.task, Some(Task::new("t1", "ABC-1")));

    // Only the image is forwarded, inlined as base64
    let requests = s.mayil.received_requests().await.unwrap();
    let snapshot = submitted_body(&requests[0]);
    assert_eq!(snapshot["key"], "ABC-1");
    assert_eq!(snapshot["fields"]["summary"], "Checkout button does nothing");
    let attachments = snapshot["fields"]["attachment"].as_array().unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0]["id"], "900");
    assert_eq!(attachments[0]["content"], STANDARD.encode(b"png"));

    let first = s.queue.take();
    assert_eq!(first, vec![(Task::new("t1", "ABC-1"), Duration::from_secs(600))]);

    // First poll: still running
    Mock::given(method("GET"))
        .and(path("/get-results/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
        .up_to_n_times(1)
        .mount(&s.mayil)
        .await;

    let outcome = s.bridge.poller.on_poll(&first[0].0).await.unwrap();
    assert_eq!(outcome, PollOutcome::Rescheduled { attempt: 1 });

    let second = s.queue.take();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].0.attempt, 1);
    assert_eq!(second[0].1, Duration::from_secs(60));

    // Second poll: completed with no prior comment
    Mock::given(method("GET"))
        .and(path("/get-results/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "result": "**done**",
            "previous_comment_id": null
        })))
        .mount(&s.mayil)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue/ABC-1/comment"))
        .and(body_json(bold_done()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "10300" })))
        .expect(1)
        .mount(&s.jira)
        .await;
    Mock::given(method("POST"))
        .and(path("/jira/post_comment"))
        .and(body_json(json!({ "task_id": "t1", "comment_id": "10300" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&s.mayil)
        .await;

    let outcome = s.bridge.poller.on_poll(&second[0].0).await.unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Completed {
            comment: Reconciled::Created {
                comment_id: "10300".to_string()
            }
        }
    );
    assert!(s.queue.take().is_empty());
}

#[tokio::test]
async fn test_repeat_completion_updates_registered_comment() {
    let s = services().await;

    Mock::given(method("GET"))
        .and(path("/get-results/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "result": "**done**",
            "previous_comment_id": 10300
        })))
        .mount(&s.mayil)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/3/issue/ABC-1/comment/10300"))
        .and(body_json(bold_done()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "10300" })))
        .expect(1)
        .mount(&s.jira)
        .await;
    Mock::given(method("POST"))
        .and(path("/jira/post_comment"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&s.mayil)
        .await;

    let outcome = s
        .bridge
        .poller
        .on_poll(&Task::new("t1", "ABC-1"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        PollOutcome::Completed {
            comment: Reconciled::Updated {
                comment_id: "10300".to_string()
            }
        }
    );
}

#[tokio::test]
async fn test_rerun_comment_deletes_trigger_and_resubmits() {
    let s = services().await;
    mount_issue(&s.jira).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/api/3/issue/ABC-1/comment/10200"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&s.jira)
        .await;
    Mock::given(method("POST"))
        .and(path("/jira/create_event"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "t2" })))
        .expect(1)
        .mount(&s.mayil)
        .await;

    let dispatched = s
        .bridge
        .dispatcher
        .dispatch(&webhook(&json!({
            "eventType": "avi:jira:commented:issue",
            "issue": { "key": "ABC-1" },
            "comment": {
                "id": "10200",
                "body": {
                    "type": "doc",
                    "version": 1,
                    "content": [{
                        "type": "paragraph",
                        "content": [
                            { "type": "mention", "attrs": { "text": "@Mayil-AI" } },
                            { "type": "text", "text": "@Mayil-AI `rerun`" }
                        ]
                    }]
                }
            }
        })))
        .await
        .unwrap();

    assert_eq!(dispatched.task, Some(Task::new("t2", "ABC-1")));
    assert_eq!(
        s.queue.take(),
        vec![(Task::new("t2", "ABC-1"), Duration::from_secs(600))]
    );
}

#[tokio::test]
async fn test_exhausted_task_posts_nothing() {
    let s = services().await;

    Mock::given(method("GET"))
        .and(path("/get-results/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
        .mount(&s.mayil)
        .await;

    let task = Task {
        attempt: 10,
        ..Task::new("t1", "ABC-1")
    };
    let outcome = s.bridge.poller.on_poll(&task).await.unwrap();

    assert!(matches!(outcome, PollOutcome::Exhausted { attempt: 10, .. }));
    assert!(s.queue.take().is_empty());
    assert!(s.jira.received_requests().await.unwrap().is_empty());
}
