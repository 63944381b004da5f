use crate::domain::entities::webhook::Webhook;
use crate::domain::entities::webhook_job::WebhookJob;
use crate::domain::services::notifier::{Notifier, NotifyError, PermanentFailureNotice};
use async_trait::async_trait;
use std::time::Duration;

/// Posts a [`PermanentFailureNotice`] as JSON to an internal endpoint.
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpNotifier {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify_permanent_failure(
        &self,
        webhook: &Webhook,
        job: &WebhookJob,
    ) -> Result<(), NotifyError> {
        let notice = PermanentFailureNotice::new(webhook, job);
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&notice)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
