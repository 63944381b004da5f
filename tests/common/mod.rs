#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use hookrelay::application::context::{AppContext, DeliveryOptions, WorkerOptions};
use hookrelay::domain::entities::webhook::Webhook;
use hookrelay::domain::entities::webhook_job::WebhookJob;
use hookrelay::domain::services::notifier::{Notifier, NotifyError};
use hookrelay::domain::value_objects::ids::{OwnerId, WebhookId, WorkspaceId};
use hookrelay::domain::workflows::backoff_policy::BackoffPolicy;
use hookrelay::infrastructure::db::repositories::Repositories;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One request as the receiver saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Scripted HTTP endpoint standing in for a customer's webhook.
pub struct ReceiverState {
    statuses: Mutex<VecDeque<u16>>,
    fallback_status: u16,
    delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub requests: Mutex<Vec<Captured>>,
}

impl ReceiverState {
    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

pub struct Receiver {
    pub url: String,
    pub state: Arc<ReceiverState>,
}

async fn receive(
    State(state): State<Arc<ReceiverState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    state.requests.lock().unwrap().push(Captured { headers, body });
    let status = state
        .statuses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(state.fallback_status);
    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    StatusCode::from_u16(status).unwrap()
}

/// Start a receiver answering `script` in order, then `fallback_status`.
pub async fn spawn_receiver(script: &[u16], fallback_status: u16, delay: Duration) -> Receiver {
    let state = Arc::new(ReceiverState {
        statuses: Mutex::new(script.iter().copied().collect()),
        fallback_status,
        delay,
        in_flight: AtomicUsize::new(0),
        max_in_flight: AtomicUsize::new(0),
        requests: Mutex::new(Vec::new()),
    });
    let app = axum::Router::new()
        .route("/hook", post(receive))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Receiver {
        url: format!("http://{addr}/hook"),
        state,
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notified: Mutex<Vec<uuid::Uuid>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.notified.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_permanent_failure(
        &self,
        _webhook: &Webhook,
        job: &WebhookJob,
    ) -> Result<(), NotifyError> {
        self.notified.lock().unwrap().push(job.id.0);
        Ok(())
    }
}

/// Start a receiver that always answers 200 with `len` bytes of body.
pub async fn spawn_large_body_receiver(len: usize) -> String {
    let app = axum::Router::new().route("/hook", post(move || async move { "x".repeat(len) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/hook")
}

pub fn test_delivery_options() -> DeliveryOptions {
    DeliveryOptions {
        user_agent: "hookrelay/test".to_string(),
        ..DeliveryOptions::default()
    }
}

/// In-memory context with zero backoff so retried jobs are due immediately.
pub fn context(concurrency: usize) -> (Arc<AppContext>, Arc<RecordingNotifier>) {
    context_with(concurrency, test_delivery_options())
}

pub fn context_with(
    concurrency: usize,
    delivery: DeliveryOptions,
) -> (Arc<AppContext>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = AppContext::new(
        Repositories::memory(),
        reqwest::Client::new(),
        notifier.clone(),
        BackoffPolicy::new(0, 0, 0.0),
        delivery,
        WorkerOptions {
            batch_size: 10,
            concurrency,
            stale_after: None,
        },
    );
    (Arc::new(ctx), notifier)
}

pub fn webhook(owner_id: OwnerId, url: &str) -> Webhook {
    Webhook {
        id: WebhookId::new(),
        owner_id,
        workspace_id: WorkspaceId::new(),
        name: "orders".to_string(),
        url: url.to_string(),
        headers: BTreeMap::new(),
        is_active: true,
        timeout_seconds: 5,
    }
}

pub async fn enqueue(ctx: &AppContext, webhook_id: WebhookId, max_retries: u32) -> WebhookJob {
    ctx.repos
        .job
        .insert(&WebhookJob::new_pending(
            webhook_id,
            "order.created",
            serde_json::json!({"order_id": 42, "total": "19.99"}),
            max_retries,
        ))
        .await
        .unwrap()
}

/// Give spawned notification tasks a moment to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
