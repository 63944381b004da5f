use crate::domain::entities::webhook::Webhook;
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::services::notifier::{Notifier, NotifyError};
use async_trait::async_trait;

/// Fallback used when no notification endpoint is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_permanent_failure(
        &self,
        webhook: &Webhook,
        job: &WebhookJob,
    ) -> Result<(), NotifyError> {
        tracing::warn!(
            webhook_id = %webhook.id,
            owner_id = %webhook.owner_id,
            job_id = %job.id,
            event_type = %job.event_type,
            retry_count = job.retry_count,
            last_error = job.last_error.as_deref().unwrap_or(""),
            "webhook delivery permanently failed"
        );
        Ok(())
    }
}
