use crate::domain::entities::webhook::Webhook;
use crate::domain::entities::webhook_job::WebhookJob;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification endpoint answered {0}")]
    Rejected(u16),
}

/// Tells a webhook owner that a job exhausted its retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_permanent_failure(
        &self,
        webhook: &Webhook,
        job: &WebhookJob,
    ) -> Result<(), NotifyError>;
}

/// Body sent to the internal notification endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PermanentFailureNotice {
    pub webhook_id: String,
    pub webhook_name: String,
    pub owner_id: String,
    pub workspace_id: String,
    pub job_id: String,
    pub event_type: String,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl PermanentFailureNotice {
    pub fn new(webhook: &Webhook, job: &WebhookJob) -> Self {
        Self {
            webhook_id: webhook.id.to_string(),
            webhook_name: webhook.name.clone(),
            owner_id: webhook.owner_id.to_string(),
            workspace_id: webhook.workspace_id.to_string(),
            job_id: job.id.to_string(),
            event_type: job.event_type.clone(),
            retry_count: job.retry_count,
            last_error: job.last_error.clone(),
        }
    }
}
