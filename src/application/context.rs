use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::domain::services::notifier::Notifier;
use crate::domain::workflows::backoff_policy::BackoffPolicy;
use crate::infrastructure::db::repositories::Repositories;
use crate::infrastructure::notify::{HttpNotifier, LogNotifier};

/// Knobs for a single outbound delivery.
#[derive(Debug, Clone)]
pub struct DeliveryOptions {
    pub timeout_ceiling: Duration,
    pub response_body_limit: usize,
    pub user_agent: String,
    pub notify_timeout: Duration,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            timeout_ceiling: Duration::from_secs(30),
            response_body_limit: 1024,
            user_agent: concat!("hookrelay/", env!("CARGO_PKG_VERSION")).to_string(),
            notify_timeout: Duration::from_secs(5),
        }
    }
}

/// Batch sizing for the dispatcher.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub batch_size: u32,
    pub concurrency: usize,
    pub stale_after: Option<Duration>,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            batch_size: 50,
            concurrency: 8,
            stale_after: None,
        }
    }
}

/// Shared application resources used by use cases and services.
pub struct AppContext {
    pub repos: Repositories,
    pub http: reqwest::Client,
    pub backoff: BackoffPolicy,
    pub notifier: Arc<dyn Notifier>,
    pub delivery: DeliveryOptions,
    pub worker: WorkerOptions,
}

impl AppContext {
    /// Build a new application context with shared repositories and services.
    pub fn new(
        repos: Repositories,
        http: reqwest::Client,
        notifier: Arc<dyn Notifier>,
        backoff: BackoffPolicy,
        delivery: DeliveryOptions,
        worker: WorkerOptions,
    ) -> Self {
        Self {
            repos,
            http,
            backoff,
            notifier,
            delivery,
            worker,
        }
    }

    /// Wire the context from loaded settings. Picks the HTTP notifier when an endpoint is set.
    pub fn from_settings(repos: Repositories, settings: &Settings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let notify_timeout = Duration::from_millis(settings.notifier.timeout_ms);
        let notifier: Arc<dyn Notifier> = match settings.notifier.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => {
                Arc::new(HttpNotifier::new(http.clone(), endpoint, notify_timeout))
            }
            _ => Arc::new(LogNotifier),
        };

        let backoff = BackoffPolicy::new(
            settings.backoff.base_ms,
            settings.backoff.cap_ms,
            settings.backoff.jitter_ratio,
        );
        let delivery = DeliveryOptions {
            timeout_ceiling: Duration::from_secs(settings.delivery.timeout_ceiling_seconds.max(1)),
            response_body_limit: settings.delivery.response_body_limit,
            user_agent: settings.delivery.user_agent.clone(),
            notify_timeout,
        };
        let worker = WorkerOptions {
            batch_size: settings.worker.batch_size.max(1),
            concurrency: settings.worker.concurrency.max(1),
            stale_after: settings
                .worker
                .stale_processing_seconds
                .map(Duration::from_secs),
        };

        Ok(Self::new(repos, http, notifier, backoff, delivery, worker))
    }
}
